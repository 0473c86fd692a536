use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: u32,
}

/// Turns raw document bytes into plain text plus a page count.
/// A document the implementation cannot parse surfaces as
/// `ExtractionFailed`, which the upload path reports as a corrupted file.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract(&self, data: &[u8]) -> Result<ExtractedText, TextExtractorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TextExtractorError {
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
    #[error("extraction timed out")]
    TimedOut,
}
