//! 在席状態の導出とロースター

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::session::UserId;

/// 利用者の表示ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStatus {
    Online,
    Idle,
}

impl UserStatus {
    /// 最終活動時刻から表示ステータスを導出する純関数
    ///
    /// 活動記録が無い場合は Online 扱いにする（作成直後のセッションは
    /// まだ最初の活動を記録していない）。
    pub fn derive(
        last_activity: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
        idle_threshold: Duration,
    ) -> Self {
        match last_activity {
            None => Self::Online,
            Some(t) if now.signed_duration_since(t) > idle_threshold => Self::Idle,
            Some(_) => Self::Online,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Idle => "idle",
        }
    }
}

/// ロースター 1 行分
///
/// Registry のスナップショット（作成時刻の昇順）から導出され、
/// 並び順はそのまま保たれる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub user_id: UserId,
    pub status: UserStatus,
}

/// ロースターの描画を抽象化する trait
///
/// 在席のコアは配信ペイロードを不透明な文字列として扱い、
/// HTML の組み立ては UI 層の実装に任せる。
pub trait RosterRenderer: Send + Sync {
    fn render(&self, entries: &[RosterEntry]) -> String;
}

/// /api/status で返す在席統計
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresenceStats {
    pub total: usize,
    pub online: usize,
    pub idle: usize,
    pub near_timeout: usize,
}
