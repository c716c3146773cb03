//! UseCase 層
//!
//! ハンドラと常駐タスクから呼ばれるアプリケーションロジック。
//! ストアと collaborator は明示的な依存として注入される。

mod authenticate;
mod broadcast_roster;
mod error;
mod fetch_history;
mod logout;
mod presence_stats;
mod reconciler;
mod send_message;

pub use authenticate::AuthenticateUseCase;
pub use broadcast_roster::BroadcastRosterUseCase;
pub use error::{AuthError, SendMessageError};
pub use fetch_history::FetchHistoryUseCase;
pub use logout::LogoutUseCase;
pub use presence_stats::PresenceStatsUseCase;
pub use reconciler::PresenceReconciler;
pub use send_message::{OutgoingMessage, SendMessageUseCase, UploadedImage};
