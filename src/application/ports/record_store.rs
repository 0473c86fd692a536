use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{BlobKey, EnrichmentUpdate, LetterRecord};

/// Persistence boundary for [`LetterRecord`]s.
///
/// Implementations must reject a `put` that reuses an existing
/// `(identifier, uploaded_at)` key, and must treat `apply_enrichment` as a
/// plain field overwrite so redelivered enrichment events stay safe.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn put(&self, record: &LetterRecord) -> Result<(), RecordStoreError>;

    /// All records for one identifier, newest first.
    async fn query_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Vec<LetterRecord>, RecordStoreError>;

    /// Records whose upload-date partition equals `partition` (`YYYY-MM`).
    async fn query_by_upload_month(
        &self,
        partition: &str,
    ) -> Result<Vec<LetterRecord>, RecordStoreError>;

    /// Exact lookup through the blob-key secondary index.
    async fn find_by_blob_key(
        &self,
        key: &BlobKey,
    ) -> Result<Option<LetterRecord>, RecordStoreError>;

    async fn apply_enrichment(
        &self,
        identifier: &str,
        uploaded_at: DateTime<Utc>,
        update: EnrichmentUpdate,
    ) -> Result<(), RecordStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RecordStoreError {
    #[error("connection failed: {0}")]
    ConnectionFailed(String),
    #[error("query failed: {0}")]
    QueryFailed(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
}
