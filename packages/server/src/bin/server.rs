//! Ephemeral anonymous group chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tomarigi-server
//! cargo run --bin tomarigi-server -- --host 0.0.0.0 --port 8080
//! ```
//!
//! `DATABASE_URL` と `ACCESS_KEY` は環境変数（または .env）から読む。

use std::sync::Arc;

use clap::Parser;

use tomarigi_server::{
    domain::AppConfig,
    infrastructure::{
        ActivityTracker, BroadcastHub, FsImageStore, PgMessageRepository, SessionRegistry,
        StorageCleaner, db,
    },
    ui::{Server, state::AppState, template::fragment::HtmxRosterRenderer},
    usecase::{
        AuthenticateUseCase, BroadcastRosterUseCase, FetchHistoryUseCase, LogoutUseCase,
        PresenceReconciler, PresenceStatsUseCase, SendMessageUseCase,
    },
};
use tomarigi_shared::{
    logger::setup_logger,
    time::{Clock, SystemClock},
};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Ephemeral anonymous group chat server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "8080")]
    port: u16,

    /// Directory served under /static
    #[arg(long, default_value = "./static")]
    static_dir: String,

    /// Directory for uploaded images, served under /uploads
    #[arg(long, default_value = "./uploads")]
    uploads_dir: String,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    // .env があれば読み込む
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let mut config = AppConfig::default();
    if let Ok(access_key) = std::env::var("ACCESS_KEY") {
        config.access_key = access_key;
    }
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost:5432/tomarigi".to_string());

    // Initialize dependencies in order:
    // 1. Database and file stores
    // 2. In-memory presence stores (Registry / Tracker / Hub)
    // 3. UseCases
    // 4. Background tasks (hub dispatcher, reconciler)
    // 5. Server

    // 1. Database and file stores
    let pool = match db::connect(&database_url).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("DB connection error: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = db::setup_schema(&pool).await {
        tracing::error!("Schema setup error: {}", e);
        std::process::exit(1);
    }
    let images = Arc::new(FsImageStore::new(&args.uploads_dir, "/uploads"));
    if let Err(e) = images.ensure_root().await {
        tracing::error!("Error creating uploads directory: {}", e);
        std::process::exit(1);
    }
    let messages = Arc::new(PgMessageRepository::new(pool.clone()));
    let cleaner = Arc::new(StorageCleaner::new(
        pool,
        images.clone(),
        config.history_limit,
    ));

    // 2. In-memory presence stores
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let registry = Arc::new(SessionRegistry::new(
        clock.clone(),
        config.session_duration,
    ));
    let activity = Arc::new(ActivityTracker::new(clock.clone()));
    let hub = Arc::new(BroadcastHub::new());

    // 3. UseCases
    let roster = Arc::new(BroadcastRosterUseCase::new(
        registry.clone(),
        activity.clone(),
        hub.clone(),
        Arc::new(HtmxRosterRenderer),
        clock.clone(),
        config.idle_threshold,
    ));
    let authenticate = Arc::new(AuthenticateUseCase::new(
        registry.clone(),
        activity.clone(),
        config.access_key.clone(),
    ));
    let send_message = Arc::new(SendMessageUseCase::new(
        registry.clone(),
        activity.clone(),
        messages.clone(),
        images.clone(),
        cleaner.clone(),
        config.max_upload_size,
    ));
    let logout = Arc::new(LogoutUseCase::new(
        registry.clone(),
        activity.clone(),
        cleaner.clone(),
        roster.clone(),
    ));
    let fetch_history = Arc::new(FetchHistoryUseCase::new(
        registry.clone(),
        messages,
        config.history_limit,
    ));
    let stats = Arc::new(PresenceStatsUseCase::new(
        registry.clone(),
        activity.clone(),
        clock.clone(),
        config.idle_threshold,
        config.max_idle_time,
    ));

    // 4. Background tasks
    {
        let hub = hub.clone();
        tokio::spawn(async move { hub.run().await });
    }
    let reconciler = Arc::new(PresenceReconciler::new(
        registry.clone(),
        activity.clone(),
        roster.clone(),
        cleaner,
        config.max_idle_time,
        config.cleanup_interval,
    ));
    tokio::spawn(reconciler.run());
    tracing::info!(
        "Started periodic presence reconciliation (interval: {:?})",
        config.cleanup_interval,
    );

    // 5. Create and run the server
    let state = Arc::new(AppState {
        config,
        registry,
        activity,
        hub,
        authenticate,
        send_message,
        logout,
        fetch_history,
        roster,
        stats,
    });
    let server = Server::new(state, args.static_dir, args.uploads_dir);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
