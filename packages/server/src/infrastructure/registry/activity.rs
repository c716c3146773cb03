//! Activity Tracker
//!
//! ユーザー ID → 最終活動時刻のインメモリ記録。Registry とは別の
//! `RwLock` を持ち、ユーザー起点の操作（ページ表示、送信、WebSocket
//! 接続）のたびに `touch` で更新される。

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use tomarigi_shared::time::Clock;

use crate::domain::UserId;

pub struct ActivityTracker {
    last_activity: RwLock<HashMap<UserId, DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl ActivityTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            last_activity: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// 最終活動時刻を現在時刻に更新する
    pub async fn touch(&self, user_id: &UserId) {
        let now = self.clock.now();
        let mut last_activity = self.last_activity.write().await;
        last_activity.insert(user_id.clone(), now);
    }

    /// 最終活動時刻を返す
    pub async fn last_seen(&self, user_id: &UserId) -> Option<DateTime<Utc>> {
        let last_activity = self.last_activity.read().await;
        last_activity.get(user_id).copied()
    }

    /// 記録を削除する（冪等）
    pub async fn forget(&self, user_id: &UserId) {
        let mut last_activity = self.last_activity.write().await;
        last_activity.remove(user_id);
    }

    /// 複数の記録を 1 回の排他ロックで削除する
    pub async fn forget_all(&self, user_ids: &[UserId]) {
        let mut last_activity = self.last_activity.write().await;
        for user_id in user_ids {
            last_activity.remove(user_id);
        }
    }

    /// 全記録の時点コピーを返す
    ///
    /// Reconciler はこのコピーに対して判定するので、Registry のロックと
    /// Tracker のロックを同時に保持せずに済む。
    pub async fn snapshot(&self) -> HashMap<UserId, DateTime<Utc>> {
        let last_activity = self.last_activity.read().await;
        last_activity.clone()
    }
}
