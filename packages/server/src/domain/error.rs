//! ドメイン層のエラー型

use thiserror::Error;

/// メッセージ永続化のエラー
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(String),
}

/// 画像保存のエラー
#[derive(Debug, Error)]
pub enum ImageStoreError {
    #[error("failed to store image: {0}")]
    Io(String),
}
