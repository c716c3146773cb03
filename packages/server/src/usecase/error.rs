//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{ImageStoreError, RepositoryError};

/// 認証失敗
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid access key")]
    InvalidKey,
}

/// メッセージ送信失敗
#[derive(Debug, Error)]
pub enum SendMessageError {
    #[error("session expired")]
    SessionExpired,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("file too large (max {0} bytes)")]
    FileTooLarge(usize),
    #[error("invalid image format")]
    InvalidImage,
    #[error(transparent)]
    Storage(#[from] RepositoryError),
    #[error(transparent)]
    Upload(#[from] ImageStoreError),
}
