//! Repository trait 定義
//!
//! ドメイン層が必要とするデータアクセスのインターフェースを定義する。
//! 具体的な実装は Infrastructure 層が提供する（依存性の逆転）。

use async_trait::async_trait;

use super::{
    error::{ImageStoreError, RepositoryError},
    message::{NewMessage, StoredMessage},
    session::UserId,
};

/// メッセージ永続化のインターフェース
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// メッセージを保存し、採番済みの行を返す
    async fn insert(&self, message: NewMessage) -> Result<StoredMessage, RepositoryError>;

    /// 指定ユーザー群の直近メッセージを古い順で返す（最大 limit 件）
    async fn recent_for_users(
        &self,
        user_ids: &[UserId],
        limit: i64,
    ) -> Result<Vec<StoredMessage>, RepositoryError>;
}

/// アップロード画像の保存先インターフェース
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// 画像を保存し、公開パス（例: "/uploads/xxxx.png"）を返す
    async fn save(&self, data: &[u8], ext: &str) -> Result<String, ImageStoreError>;

    /// 公開パスで指定された画像を削除する（best-effort、失敗はログのみ）
    async fn remove(&self, public_path: &str);
}
