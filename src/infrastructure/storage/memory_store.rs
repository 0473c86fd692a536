use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;

use crate::application::ports::{BlobStore, BlobStoreError};
use crate::domain::BlobKey;

/// Map-backed blob store for tests and scaffold runs.
#[derive(Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<BlobKey, Vec<u8>>>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put(
        &self,
        key: &BlobKey,
        data: Bytes,
        _content_type: &str,
    ) -> Result<(), BlobStoreError> {
        self.blobs
            .write()
            .map_err(|e| BlobStoreError::UploadFailed(e.to_string()))?
            .insert(key.clone(), data.to_vec());
        Ok(())
    }

    async fn get(&self, key: &BlobKey) -> Result<Vec<u8>, BlobStoreError> {
        self.blobs
            .read()
            .map_err(|e| BlobStoreError::DownloadFailed(e.to_string()))?
            .get(key)
            .cloned()
            .ok_or_else(|| BlobStoreError::NotFound(key.to_string()))
    }
}
