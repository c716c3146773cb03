//! PostgreSQL Message Repository 実装
//!
//! ドメイン層が定義する `MessageRepository` trait の sqlx 実装。
//! DB の行とドメインモデルの間には変換用の行構造体を挟む。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{MessageRepository, NewMessage, RepositoryError, StoredMessage, UserId};

/// messages テーブルの 1 行（DB とドメインモデルの変換用）
#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i32,
    username: String,
    content: String,
    user_id: String,
    image_path: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<MessageRow> for StoredMessage {
    fn from(row: MessageRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            content: row.content,
            user_id: UserId::from(row.user_id),
            image_path: row.image_path,
            created_at: row.created_at,
        }
    }
}

pub struct PgMessageRepository {
    pool: PgPool,
}

impl PgMessageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageRepository for PgMessageRepository {
    async fn insert(&self, message: NewMessage) -> Result<StoredMessage, RepositoryError> {
        let row: MessageRow = sqlx::query_as(
            "INSERT INTO messages (username, content, user_id, image_path) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, username, content, user_id, image_path, created_at",
        )
        .bind(&message.username)
        .bind(&message.content)
        .bind(message.user_id.as_str())
        .bind(&message.image_path)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(row.into())
    }

    async fn recent_for_users(
        &self,
        user_ids: &[UserId],
        limit: i64,
    ) -> Result<Vec<StoredMessage>, RepositoryError> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<String> = user_ids.iter().map(|u| u.as_str().to_string()).collect();
        // 直近 limit 件を取ってから古い順に並べ直す
        let rows: Vec<MessageRow> = sqlx::query_as(
            "SELECT id, username, content, user_id, image_path, created_at \
             FROM ( \
                 SELECT * FROM messages \
                 WHERE user_id = ANY($1) \
                 ORDER BY created_at DESC LIMIT $2 \
             ) recent \
             ORDER BY created_at ASC",
        )
        .bind(&ids)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(rows.into_iter().map(StoredMessage::from).collect())
    }
}
