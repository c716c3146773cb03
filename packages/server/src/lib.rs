//! Ephemeral anonymous group chat server.
//!
//! Clients authenticate with a shared access key, receive a time-boxed
//! session, and exchange messages over HTTP and WebSocket. Presence is
//! kept in memory and reconciled periodically; message history is capped
//! and aggressively pruned.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
