mod blob_store;
mod record_store;
mod summarizer;
mod text_extractor;

pub use blob_store::{BlobStore, BlobStoreError};
pub use record_store::{RecordStore, RecordStoreError};
pub use summarizer::{Summarizer, SummarizerError};
pub use text_extractor::{ExtractedText, TextExtractor, TextExtractorError};
