//! Infrastructure 層
//!
//! インメモリの在席ストア、WebSocket の配信ハブ、PostgreSQL と
//! ファイルシステムへの永続化を実装する。

pub mod cleaner;
pub mod db;
pub mod hub;
pub mod registry;
pub mod repository;
pub mod uploads;

pub use cleaner::StorageCleaner;
pub use hub::{BroadcastHub, ConnectionId};
pub use registry::{ActivityTracker, SessionRegistry};
pub use repository::PgMessageRepository;
pub use uploads::FsImageStore;
