use std::time::Duration;

use async_trait::async_trait;

use crate::application::ports::{ExtractedText, TextExtractor, TextExtractorError};

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

/// Text extraction from PDF bytes. Parsing runs on the blocking pool with a
/// hard timeout; an unparseable document surfaces as `ExtractionFailed`.
#[derive(Default)]
pub struct PdfTextExtractor;

impl PdfTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_blocking(data: &[u8]) -> Result<ExtractedText, TextExtractorError> {
        let document = lopdf::Document::load_mem(data).map_err(|e| {
            TextExtractorError::ExtractionFailed(format!("failed to parse PDF: {e}"))
        })?;
        let page_count = document.get_pages().len() as u32;

        let text = pdf_extract::extract_text_from_mem(data).map_err(|e| {
            TextExtractorError::ExtractionFailed(format!("failed to extract text: {e}"))
        })?;

        // A scanned letter with no text layer still ingests; the field
        // extractor treats empty text as all-absent.
        Ok(ExtractedText {
            text: text.trim().to_string(),
            page_count,
        })
    }
}

#[async_trait]
impl TextExtractor for PdfTextExtractor {
    #[tracing::instrument(skip(self, data), fields(bytes = data.len()))]
    async fn extract(&self, data: &[u8]) -> Result<ExtractedText, TextExtractorError> {
        let owned = data.to_vec();

        let extracted = tokio::time::timeout(
            EXTRACTION_TIMEOUT,
            tokio::task::spawn_blocking(move || Self::extract_blocking(&owned)),
        )
        .await
        .map_err(|_| TextExtractorError::TimedOut)?
        .map_err(|e| TextExtractorError::ExtractionFailed(format!("task join error: {e}")))??;

        tracing::info!(
            page_count = extracted.page_count,
            chars = extracted.text.len(),
            "PDF text extraction complete"
        );

        Ok(extracted)
    }
}
