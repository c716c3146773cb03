//! UseCase: アクセスキー認証とセッション発行

use std::sync::Arc;

use crate::domain::{Session, UserId};
use crate::infrastructure::{ActivityTracker, SessionRegistry};

use super::error::AuthError;

/// 共有アクセスキーを照合してセッションを発行するユースケース
pub struct AuthenticateUseCase {
    registry: Arc<SessionRegistry>,
    activity: Arc<ActivityTracker>,
    access_key: String,
}

impl AuthenticateUseCase {
    pub fn new(
        registry: Arc<SessionRegistry>,
        activity: Arc<ActivityTracker>,
        access_key: String,
    ) -> Self {
        Self {
            registry,
            activity,
            access_key,
        }
    }

    /// キーが一致すれば新しいセッションを発行する
    ///
    /// 失敗時は状態を一切変更しない。
    pub async fn execute(&self, provided_key: &str) -> Result<Session, AuthError> {
        if provided_key != self.access_key {
            return Err(AuthError::InvalidKey);
        }

        let user_id = UserId::generate();
        let session = self.registry.create(user_id).await;
        self.activity.touch(&session.user_id).await;
        tracing::info!("Issued session for user {}", session.user_id.short());

        Ok(session)
    }
}
