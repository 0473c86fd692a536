mod mock_summarizer;
mod openai_summarizer;

pub use mock_summarizer::MockSummarizer;
pub use openai_summarizer::OpenAiSummarizer;
