//! アップロード画像のファイルシステム保存

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use tomarigi_shared::id::generate_token;

use crate::domain::{ImageStore, ImageStoreError};

/// ファイル名に使うランダムトークンのバイト長
const FILE_TOKEN_BYTES: usize = 16;

/// uploads ディレクトリ配下に画像を保存する `ImageStore` 実装
pub struct FsImageStore {
    /// 保存先ディレクトリ（例: ./uploads）
    root: PathBuf,
    /// 公開 URL の接頭辞（例: /uploads）
    public_prefix: String,
}

impl FsImageStore {
    pub fn new(root: impl Into<PathBuf>, public_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_prefix: public_prefix.into(),
        }
    }

    /// 保存先ディレクトリを作成する（起動時に 1 回呼ぶ）
    pub async fn ensure_root(&self) -> Result<(), ImageStoreError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| ImageStoreError::Io(e.to_string()))
    }
}

#[async_trait]
impl ImageStore for FsImageStore {
    async fn save(&self, data: &[u8], ext: &str) -> Result<String, ImageStoreError> {
        let file_name = format!("{}{}", generate_token(FILE_TOKEN_BYTES), ext);
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, data)
            .await
            .map_err(|e| ImageStoreError::Io(e.to_string()))?;
        Ok(format!("{}/{}", self.public_prefix, file_name))
    }

    async fn remove(&self, public_path: &str) {
        // 公開パスからファイル名部分だけを使う（パス走査を防ぐ）
        let Some(file_name) = Path::new(public_path).file_name() else {
            return;
        };
        let path = self.root.join(file_name);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!("Deleted image file: {}", public_path),
            Err(e) => tracing::warn!("Error deleting image file {}: {}", public_path, e),
        }
    }
}
