//! Server state shared across handlers.

use std::sync::Arc;

use crate::domain::AppConfig;
use crate::infrastructure::{ActivityTracker, BroadcastHub, SessionRegistry};
use crate::usecase::{
    AuthenticateUseCase, BroadcastRosterUseCase, FetchHistoryUseCase, LogoutUseCase,
    PresenceStatsUseCase, SendMessageUseCase,
};

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<SessionRegistry>,
    pub activity: Arc<ActivityTracker>,
    pub hub: Arc<BroadcastHub>,
    pub authenticate: Arc<AuthenticateUseCase>,
    pub send_message: Arc<SendMessageUseCase>,
    pub logout: Arc<LogoutUseCase>,
    pub fetch_history: Arc<FetchHistoryUseCase>,
    pub roster: Arc<BroadcastRosterUseCase>,
    pub stats: Arc<PresenceStatsUseCase>,
}
