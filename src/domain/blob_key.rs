use std::fmt;

use serde::{Deserialize, Serialize};

/// Name under which the raw document bytes are stored in the blob store.
///
/// The upload path derives it from the validated filename; enrichment events
/// carry it back to locate the matching record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobKey(String);

impl BlobKey {
    pub fn from_filename(filename: &str) -> Self {
        Self(filename.to_string())
    }

    pub fn from_raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key names a document of the expected type.
    pub fn is_pdf(&self) -> bool {
        self.0.to_ascii_lowercase().ends_with(".pdf")
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
