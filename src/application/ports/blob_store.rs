use std::io;

use async_trait::async_trait;
use bytes::Bytes;

use crate::domain::BlobKey;

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(
        &self,
        key: &BlobKey,
        data: Bytes,
        content_type: &str,
    ) -> Result<(), BlobStoreError>;

    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, BlobStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
