//! WebSocket の配信ハブ

pub mod broadcast;

pub use broadcast::{BroadcastHub, ConnectionId};
