/// MIME type the upload must declare, compared exactly after trimming.
pub const EXPECTED_CONTENT_TYPE: &str = "application/pdf";

/// Required filename extension, matched case-insensitively.
pub const EXPECTED_EXTENSION: &str = ".pdf";

/// Magic-byte signature every well-formed PDF starts with.
pub const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("unexpected content type: {0}")]
    ContentType(String),
    #[error("filename does not end with {EXPECTED_EXTENSION}: {0}")]
    Extension(String),
    #[error("file does not start with the PDF signature")]
    MagicBytes,
    #[error("file of {actual} bytes exceeds the {limit} byte limit")]
    TooLarge { actual: u64, limit: u64 },
}

/// Upload gate. Checks run in order and stop at the first failure; no check
/// has side effects.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    max_file_size: u64,
}

impl UploadValidator {
    pub fn new(max_file_size: u64) -> Self {
        Self { max_file_size }
    }

    pub fn validate(
        &self,
        data: &[u8],
        content_type: &str,
        filename: &str,
    ) -> Result<(), ValidationError> {
        let declared = content_type.trim();
        if declared != EXPECTED_CONTENT_TYPE {
            return Err(ValidationError::ContentType(declared.to_string()));
        }

        if !filename
            .to_ascii_lowercase()
            .ends_with(EXPECTED_EXTENSION)
        {
            return Err(ValidationError::Extension(filename.to_string()));
        }

        // Headers can lie; the signature check catches mislabeled or
        // truncated files.
        if !data.starts_with(PDF_MAGIC) {
            return Err(ValidationError::MagicBytes);
        }

        if data.len() as u64 > self.max_file_size {
            return Err(ValidationError::TooLarge {
                actual: data.len() as u64,
                limit: self.max_file_size,
            });
        }

        Ok(())
    }
}
