//! UseCase: メッセージ送信
//!
//! セッションの再検証、活動の記録、画像の検証と保存、永続化、履歴の
//! 刈り込みまでを担う。配信は UI 層が行う（ペイロードが描画済み
//! フラグメントのため、採番済みの行を返してハンドラに描画させる）。

use std::sync::Arc;

use crate::domain::{
    ImageStore, MessageRepository, NewMessage, ResourceCleaner, Session, StoredMessage,
};
use crate::infrastructure::{ActivityTracker, SessionRegistry};

use super::error::SendMessageError;

/// username が空のときに使う表示名
const DEFAULT_USERNAME: &str = "Anon";

/// multipart から取り出したアップロード画像
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub data: Vec<u8>,
    /// 元ファイル名から取った拡張子（"." 付き、無ければ ".jpg"）
    pub ext: String,
}

/// 送信フォームの内容
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub username: String,
    pub content: String,
    pub image: Option<UploadedImage>,
}

pub struct SendMessageUseCase {
    registry: Arc<SessionRegistry>,
    activity: Arc<ActivityTracker>,
    messages: Arc<dyn MessageRepository>,
    images: Arc<dyn ImageStore>,
    cleaner: Arc<dyn ResourceCleaner>,
    max_upload_size: usize,
}

impl SendMessageUseCase {
    pub fn new(
        registry: Arc<SessionRegistry>,
        activity: Arc<ActivityTracker>,
        messages: Arc<dyn MessageRepository>,
        images: Arc<dyn ImageStore>,
        cleaner: Arc<dyn ResourceCleaner>,
        max_upload_size: usize,
    ) -> Self {
        Self {
            registry,
            activity,
            messages,
            images,
            cleaner,
            max_upload_size,
        }
    }

    pub async fn execute(
        &self,
        session: &Session,
        outgoing: OutgoingMessage,
    ) -> Result<StoredMessage, SendMessageError> {
        // 1. 再検証（ミドルウェア通過後に失効している場合がある）
        if self.registry.validate(&session.id).await.is_none() {
            return Err(SendMessageError::SessionExpired);
        }

        // 2. 活動の記録
        self.activity.touch(&session.user_id).await;

        let username = if outgoing.username.is_empty() {
            DEFAULT_USERNAME.to_string()
        } else {
            outgoing.username
        };

        // 3. 画像の検証と保存
        let image_path = match outgoing.image {
            Some(image) => Some(self.store_image(image).await?),
            None => None,
        };

        if outgoing.content.is_empty() && image_path.is_none() {
            return Err(SendMessageError::EmptyMessage);
        }

        // 4. 永続化と履歴の刈り込み
        let stored = self
            .messages
            .insert(NewMessage {
                username,
                content: outgoing.content,
                user_id: session.user_id.clone(),
                image_path,
            })
            .await?;
        self.cleaner.prune_history().await;

        Ok(stored)
    }

    async fn store_image(&self, image: UploadedImage) -> Result<String, SendMessageError> {
        if image.data.len() > self.max_upload_size {
            return Err(SendMessageError::FileTooLarge(self.max_upload_size));
        }
        // ヘッダだけで画像形式を判定する（本文のデコードはしない）
        if image::guess_format(&image.data).is_err() {
            return Err(SendMessageError::InvalidImage);
        }
        Ok(self.images.save(&image.data, &image.ext).await?)
    }
}
