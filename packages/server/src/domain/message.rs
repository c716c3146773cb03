//! チャットメッセージのエンティティ

use chrono::{DateTime, Utc};

use super::session::UserId;

/// 永続化済みメッセージ（messages テーブルの 1 行）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: i32,
    pub username: String,
    pub content: String,
    pub user_id: UserId,
    pub image_path: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// 挿入前のメッセージ
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub username: String,
    pub content: String,
    pub user_id: UserId,
    pub image_path: Option<String>,
}
