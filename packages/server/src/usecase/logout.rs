//! UseCase: ログアウト
//!
//! セッションと活動記録を取り除き、そのユーザーの痕跡の削除を背景
//! タスクに任せ、ロースターを配信し直す。ストアへの操作は常に
//! Registry → Tracker の順で、ロックを同時には保持しない。

use std::sync::Arc;

use crate::domain::{ResourceCleaner, Session};
use crate::infrastructure::{ActivityTracker, SessionRegistry};

use super::broadcast_roster::BroadcastRosterUseCase;

pub struct LogoutUseCase {
    registry: Arc<SessionRegistry>,
    activity: Arc<ActivityTracker>,
    cleaner: Arc<dyn ResourceCleaner>,
    roster: Arc<BroadcastRosterUseCase>,
}

impl LogoutUseCase {
    pub fn new(
        registry: Arc<SessionRegistry>,
        activity: Arc<ActivityTracker>,
        cleaner: Arc<dyn ResourceCleaner>,
        roster: Arc<BroadcastRosterUseCase>,
    ) -> Self {
        Self {
            registry,
            activity,
            cleaner,
            roster,
        }
    }

    pub async fn execute(&self, session: &Session) {
        self.registry.remove(&session.id).await;
        self.activity.forget(&session.user_id).await;

        // 痕跡の削除はレスポンスを待たせない
        let cleaner = self.cleaner.clone();
        let user_id = session.user_id.clone();
        tokio::spawn(async move {
            cleaner.purge_user(&user_id).await;
        });

        self.roster.execute().await;
        tracing::info!("User {} logged out", session.user_id.short());
    }
}
