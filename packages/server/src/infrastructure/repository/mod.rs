//! メッセージ永続化の実装

pub mod postgres;

pub use postgres::PgMessageRepository;
