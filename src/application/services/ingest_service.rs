use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use tokio::sync::mpsc;

use crate::application::ports::{
    BlobStore, BlobStoreError, RecordStore, RecordStoreError, TextExtractor, TextExtractorError,
};
use crate::application::services::enrichment_worker::{BlobCreated, EnrichmentBatch};
use crate::application::services::letter_extractor::{
    extract_fields, month_partition, normalize_identifier,
};
use crate::application::services::upload_validator::{
    UploadValidator, ValidationError, EXPECTED_CONTENT_TYPE,
};
use crate::domain::{BlobKey, LetterRecord, RecordStatus};

/// What the caller gets back from a successful upload: enough for immediate
/// feedback without waiting for enrichment.
#[derive(Debug, Clone)]
pub struct IngestReceipt {
    pub identifier: String,
    pub uploaded_at: DateTime<Utc>,
    pub blob_key: BlobKey,
    pub file_name: String,
    pub file_size: u64,
    pub num_pages: u32,
    pub letter_date: Option<String>,
    pub letter_body: Option<String>,
}

/// Synchronous upload pipeline: validate, extract, duplicate-check, store
/// blob, store record, publish the enrichment event. One request is one
/// linear sequence of awaits.
pub struct IngestService {
    validator: UploadValidator,
    text_extractor: Arc<dyn TextExtractor>,
    blob_store: Arc<dyn BlobStore>,
    record_store: Arc<dyn RecordStore>,
    enrichment_sender: mpsc::Sender<EnrichmentBatch>,
}

impl IngestService {
    pub fn new(
        validator: UploadValidator,
        text_extractor: Arc<dyn TextExtractor>,
        blob_store: Arc<dyn BlobStore>,
        record_store: Arc<dyn RecordStore>,
        enrichment_sender: mpsc::Sender<EnrichmentBatch>,
    ) -> Self {
        Self {
            validator,
            text_extractor,
            blob_store,
            record_store,
            enrichment_sender,
        }
    }

    #[tracing::instrument(skip(self, data), fields(filename = %filename, bytes = data.len()))]
    pub async fn ingest(
        &self,
        data: Bytes,
        content_type: &str,
        filename: &str,
    ) -> Result<IngestReceipt, UploadError> {
        self.validator.validate(&data, content_type, filename)?;

        let extracted = self
            .text_extractor
            .extract(&data)
            .await
            .map_err(UploadError::Extraction)?;

        let fields = extract_fields(&extracted.text);

        // Every record needs a partition key, even when the document had no
        // recognizable identifier.
        let identifier = fields
            .identifier
            .as_deref()
            .and_then(normalize_identifier)
            .unwrap_or_else(|| format!("UNKNOWN-{}", Utc::now().timestamp_millis()));

        let content_hash = hex_digest(&data);

        let existing = self
            .record_store
            .query_by_identifier(&identifier)
            .await
            .map_err(UploadError::RecordStore)?;
        if let Some(previous) = existing.iter().find(|r| r.content_hash == content_hash) {
            tracing::warn!(
                identifier = %identifier,
                existing_file = %previous.file_name,
                "Duplicate upload rejected"
            );
            return Err(UploadError::Duplicate {
                existing_file: previous.file_name.clone(),
                uploaded_at: previous.uploaded_at,
            });
        }

        let uploaded_at = Utc::now();
        let upload_iso = uploaded_at.to_rfc3339();
        let blob_key = BlobKey::from_filename(filename);

        let record = LetterRecord {
            identifier: identifier.clone(),
            uploaded_at,
            file_name: filename.to_string(),
            blob_key: blob_key.clone(),
            letter_date: fields.letter_date.clone(),
            letter_body: fields.body.clone(),
            file_size: data.len() as u64,
            num_pages: extracted.page_count,
            upload_date_partition: month_partition(&upload_iso)
                .unwrap_or_else(|| upload_iso[..7].to_string()),
            letter_date_partition: fields.letter_date.as_deref().and_then(month_partition),
            content_hash,
            status: RecordStatus::Pending,
            summary: None,
            processed_at: None,
        };

        // Blob first, record second. A record-write failure leaves an orphan
        // blob; the worker's no-record path skips it.
        self.blob_store
            .put(&blob_key, data, EXPECTED_CONTENT_TYPE)
            .await
            .map_err(UploadError::BlobStore)?;

        self.record_store
            .put(&record)
            .await
            .map_err(UploadError::RecordStore)?;

        // Published after the record write so enrichment can always find it.
        let batch = EnrichmentBatch::first_delivery(vec![BlobCreated {
            key: blob_key.clone(),
        }]);
        // try_send so a full queue never stalls the upload response. The
        // record stays pending; an external redelivery (or restart sweep)
        // picks it up later.
        if let Err(e) = self.enrichment_sender.try_send(batch) {
            tracing::error!(error = %e, blob_key = %blob_key, "Failed to enqueue enrichment event");
        }

        tracing::info!(
            identifier = %record.identifier,
            blob_key = %blob_key,
            num_pages = record.num_pages,
            "Letter ingested"
        );

        Ok(IngestReceipt {
            identifier: record.identifier,
            uploaded_at,
            blob_key,
            file_name: record.file_name,
            file_size: record.file_size,
            num_pages: record.num_pages,
            letter_date: record.letter_date,
            letter_body: record.letter_body,
        })
    }
}

fn hex_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let digest = hasher.finalize();
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),
    #[error("identical content already uploaded as {existing_file} at {uploaded_at}")]
    Duplicate {
        existing_file: String,
        uploaded_at: DateTime<Utc>,
    },
    #[error("corrupted document: {0}")]
    Extraction(TextExtractorError),
    #[error("blob store: {0}")]
    BlobStore(BlobStoreError),
    #[error("record store: {0}")]
    RecordStore(RecordStoreError),
}
