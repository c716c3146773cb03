//! HTTP / WebSocket handlers.

mod http;
mod websocket;

pub use http::{
    add_kaomoji, authenticate, chat, greeter, health_check, kaomoji_picker, logout,
    presence_status, send_message,
};
pub use websocket::websocket_handler;
