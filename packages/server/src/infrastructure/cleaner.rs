//! リソース掃除の実装
//!
//! ドメイン層の `ResourceCleaner` trait の PostgreSQL + ファイルシステム
//! 実装。メッセージ行を消す前に、その行が参照する画像ファイルを消す。
//! すべて best-effort で、エラーはログに残して握りつぶす。

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::{ImageStore, ResourceCleaner, UserId};

pub struct StorageCleaner {
    pool: PgPool,
    images: Arc<dyn ImageStore>,
    history_limit: i64,
}

impl StorageCleaner {
    pub fn new(pool: PgPool, images: Arc<dyn ImageStore>, history_limit: i64) -> Self {
        Self {
            pool,
            images,
            history_limit,
        }
    }

    /// 取得済みの image_path 群のファイルを削除する
    async fn remove_image_files(&self, paths: Vec<Option<String>>) {
        for path in paths.into_iter().flatten() {
            if !path.is_empty() {
                self.images.remove(&path).await;
            }
        }
    }
}

#[async_trait]
impl ResourceCleaner for StorageCleaner {
    async fn purge_user(&self, user_id: &UserId) {
        let paths: Result<Vec<Option<String>>, sqlx::Error> = sqlx::query_scalar(
            "SELECT image_path FROM messages WHERE user_id = $1 AND image_path IS NOT NULL",
        )
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await;
        match paths {
            Ok(paths) => self.remove_image_files(paths).await,
            Err(e) => tracing::warn!("Error querying images to delete: {}", e),
        }

        match sqlx::query("DELETE FROM messages WHERE user_id = $1")
            .bind(user_id.as_str())
            .execute(&self.pool)
            .await
        {
            Ok(_) => tracing::info!("Deleted messages for departed user: {}", user_id.short()),
            Err(e) => tracing::warn!(
                "Error deleting messages for user {}: {}",
                user_id.short(),
                e,
            ),
        }
    }

    async fn purge_orphans(&self, active_user_ids: &[UserId]) {
        if active_user_ids.is_empty() {
            // 誰もいないときは盤面ごと消す（エフェメラル設計の意図した方針）
            let paths: Result<Vec<Option<String>>, sqlx::Error> =
                sqlx::query_scalar("SELECT image_path FROM messages WHERE image_path IS NOT NULL")
                    .fetch_all(&self.pool)
                    .await;
            match paths {
                Ok(paths) => self.remove_image_files(paths).await,
                Err(e) => tracing::warn!("Error querying images to delete: {}", e),
            }

            match sqlx::query("DELETE FROM messages").execute(&self.pool).await {
                Ok(result) if result.rows_affected() > 0 => tracing::info!(
                    "Cleared all messages due to no active sessions: {} messages",
                    result.rows_affected(),
                ),
                Ok(_) => {}
                Err(e) => tracing::warn!("Error clearing all messages: {}", e),
            }
            return;
        }

        let ids: Vec<String> = active_user_ids
            .iter()
            .map(|u| u.as_str().to_string())
            .collect();

        let paths: Result<Vec<Option<String>>, sqlx::Error> = sqlx::query_scalar(
            "SELECT image_path FROM messages \
             WHERE user_id <> ALL($1) AND image_path IS NOT NULL",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await;
        match paths {
            Ok(paths) => self.remove_image_files(paths).await,
            Err(e) => tracing::warn!("Error querying images to delete: {}", e),
        }

        match sqlx::query("DELETE FROM messages WHERE user_id <> ALL($1)")
            .bind(&ids)
            .execute(&self.pool)
            .await
        {
            Ok(result) if result.rows_affected() > 0 => {
                tracing::info!("Cleaned up {} orphaned messages", result.rows_affected());
            }
            Ok(_) => {}
            Err(e) => tracing::warn!("Error cleaning up orphaned messages: {}", e),
        }
    }

    async fn prune_history(&self) {
        let paths: Result<Vec<Option<String>>, sqlx::Error> = sqlx::query_scalar(
            "SELECT image_path FROM messages \
             WHERE id NOT IN (SELECT id FROM messages ORDER BY created_at DESC LIMIT $1) \
             AND image_path IS NOT NULL",
        )
        .bind(self.history_limit)
        .fetch_all(&self.pool)
        .await;
        match paths {
            Ok(paths) => self.remove_image_files(paths).await,
            Err(e) => tracing::warn!("Error querying images to delete: {}", e),
        }

        if let Err(e) = sqlx::query(
            "DELETE FROM messages \
             WHERE id NOT IN (SELECT id FROM messages ORDER BY created_at DESC LIMIT $1)",
        )
        .bind(self.history_limit)
        .execute(&self.pool)
        .await
        {
            tracing::warn!("Error during message cleanup: {}", e);
        }
    }
}
