//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post},
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::{
    handler::{
        add_kaomoji, authenticate, chat, greeter, health_check, kaomoji_picker, logout,
        presence_status, send_message, websocket_handler,
    },
    middleware::require_session,
    signal::shutdown_signal,
    state::AppState,
};

/// multipart 本文の上限のうち、画像以外のフィールドに見込む余裕
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Ephemeral chat server
///
/// This struct encapsulates the server configuration and provides methods
/// to run the server.
pub struct Server {
    state: Arc<AppState>,
    static_dir: String,
    uploads_dir: String,
}

impl Server {
    pub fn new(state: Arc<AppState>, static_dir: String, uploads_dir: String) -> Self {
        Self {
            state,
            static_dir,
            uploads_dir,
        }
    }

    /// Run the chat server
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let body_limit = self.state.config.max_upload_size + FORM_OVERHEAD_BYTES;

        // セッション必須のルート
        let protected = Router::new()
            .route("/chat", get(chat))
            .route("/ws", get(websocket_handler))
            .route("/send-message", post(send_message))
            .route("/logout", post(logout))
            .route("/emojis", get(kaomoji_picker))
            .route("/add-emoji", post(add_kaomoji))
            .route_layer(from_fn_with_state(self.state.clone(), require_session));

        let app = Router::new()
            .route("/", get(greeter))
            .route("/auth", post(authenticate))
            .route("/api/health", get(health_check))
            .route("/api/status", get(presence_status))
            .merge(protected)
            .nest_service("/static", ServeDir::new(&self.static_dir))
            .nest_service("/uploads", ServeDir::new(&self.uploads_dir))
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone());

        // Bind the server to the host and port
        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!("Chat server listening on {}", listener.local_addr()?);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
