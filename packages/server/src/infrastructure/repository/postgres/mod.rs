//! PostgreSQL Repository 実装

pub mod message;

pub use message::PgMessageRepository;
