use crate::application::ports::{Summarizer, SummarizerError};

/// Canned summarizer for scaffold runs without an API key.
pub struct MockSummarizer;

#[async_trait::async_trait]
impl Summarizer for MockSummarizer {
    async fn summarize(&self, _text: &str) -> Result<String, SummarizerError> {
        Ok("Mock summary".to_string())
    }
}
