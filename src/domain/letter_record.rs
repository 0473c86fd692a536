use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::BlobKey;

/// Enrichment state of a stored letter. Transitions only forward,
/// `Pending` to `Processed`, exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordStatus {
    Pending,
    Processed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Pending => "PENDING",
            RecordStatus::Processed => "PROCESSED",
        }
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(RecordStatus::Pending),
            "PROCESSED" => Ok(RecordStatus::Processed),
            _ => Err(format!("Invalid record status: {}", s)),
        }
    }
}

impl fmt::Display for RecordStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The persisted letter entity.
///
/// Uniquely keyed by `(identifier, uploaded_at)`. After creation only
/// `status`, `summary` and `processed_at` ever change, and only through
/// [`EnrichmentUpdate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterRecord {
    /// Patient identifier extracted from the text, or a synthesized
    /// `UNKNOWN-<millis>` placeholder. Grouping key for duplicate checks.
    pub identifier: String,
    pub uploaded_at: DateTime<Utc>,
    pub file_name: String,
    pub blob_key: BlobKey,
    pub letter_date: Option<String>,
    pub letter_body: Option<String>,
    pub file_size: u64,
    pub num_pages: u32,
    /// `YYYY-MM` of `uploaded_at`, for range queries by upload month.
    pub upload_date_partition: String,
    /// `YYYY-MM` of `letter_date` when present.
    pub letter_date_partition: Option<String>,
    /// SHA-256 hex of the raw bytes; duplicate detection scoped to
    /// `identifier`.
    pub content_hash: String,
    pub status: RecordStatus,
    pub summary: Option<String>,
    pub processed_at: Option<DateTime<Utc>>,
}

/// The one mutation a record ever receives: the pending-to-processed
/// transition written by the enrichment worker.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentUpdate {
    pub summary: Option<String>,
    pub processed_at: DateTime<Utc>,
}

impl LetterRecord {
    pub fn is_processed(&self) -> bool {
        self.status == RecordStatus::Processed
    }
}
