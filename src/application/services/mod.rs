mod enrichment_worker;
mod ingest_service;
pub mod letter_extractor;
mod upload_validator;

pub use enrichment_worker::{
    BlobCreated, EnrichmentBatch, EnrichmentError, EnrichmentWorker, MAX_DELIVERIES,
};
pub use ingest_service::{IngestReceipt, IngestService, UploadError};
pub use upload_validator::{
    UploadValidator, ValidationError, EXPECTED_CONTENT_TYPE, EXPECTED_EXTENSION, PDF_MAGIC,
};
