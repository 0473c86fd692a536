use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::application::ports::{RecordStore, RecordStoreError};
use crate::domain::{BlobKey, EnrichmentUpdate, LetterRecord, RecordStatus};

type PrimaryKey = (String, DateTime<Utc>);

#[derive(Default)]
struct Tables {
    records: HashMap<PrimaryKey, LetterRecord>,
    /// Secondary index: blob key to primary key of the owning record.
    by_blob_key: HashMap<BlobKey, PrimaryKey>,
}

/// In-process record store keeping the same index surface a hosted document
/// table would: primary key `(identifier, uploaded_at)`, a blob-key index
/// for enrichment lookups, and partition scans by upload month.
#[derive(Default)]
pub struct InMemoryRecordStore {
    tables: RwLock<Tables>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn put(&self, record: &LetterRecord) -> Result<(), RecordStoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| RecordStoreError::ConnectionFailed(e.to_string()))?;

        let key = (record.identifier.clone(), record.uploaded_at);
        if tables.records.contains_key(&key) {
            return Err(RecordStoreError::ConstraintViolation(format!(
                "record already exists: ({}, {})",
                key.0, key.1
            )));
        }

        tables.by_blob_key.insert(record.blob_key.clone(), key.clone());
        tables.records.insert(key, record.clone());
        Ok(())
    }

    async fn query_by_identifier(
        &self,
        identifier: &str,
    ) -> Result<Vec<LetterRecord>, RecordStoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| RecordStoreError::ConnectionFailed(e.to_string()))?;

        let mut matches: Vec<LetterRecord> = tables
            .records
            .values()
            .filter(|r| r.identifier == identifier)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(matches)
    }

    async fn query_by_upload_month(
        &self,
        partition: &str,
    ) -> Result<Vec<LetterRecord>, RecordStoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| RecordStoreError::ConnectionFailed(e.to_string()))?;

        let mut matches: Vec<LetterRecord> = tables
            .records
            .values()
            .filter(|r| r.upload_date_partition == partition)
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        Ok(matches)
    }

    async fn find_by_blob_key(
        &self,
        key: &BlobKey,
    ) -> Result<Option<LetterRecord>, RecordStoreError> {
        let tables = self
            .tables
            .read()
            .map_err(|e| RecordStoreError::ConnectionFailed(e.to_string()))?;

        Ok(tables
            .by_blob_key
            .get(key)
            .and_then(|pk| tables.records.get(pk))
            .cloned())
    }

    async fn apply_enrichment(
        &self,
        identifier: &str,
        uploaded_at: DateTime<Utc>,
        update: EnrichmentUpdate,
    ) -> Result<(), RecordStoreError> {
        let mut tables = self
            .tables
            .write()
            .map_err(|e| RecordStoreError::ConnectionFailed(e.to_string()))?;

        let key = (identifier.to_string(), uploaded_at);
        let record = tables.records.get_mut(&key).ok_or_else(|| {
            RecordStoreError::NotFound(format!("({}, {})", identifier, uploaded_at))
        })?;

        // Plain overwrite: a redelivered enrichment lands on the same values.
        record.status = RecordStatus::Processed;
        record.summary = update.summary;
        record.processed_at = Some(update.processed_at);
        Ok(())
    }
}
