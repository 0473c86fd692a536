pub mod observability;
pub mod persistence;
pub mod storage;
pub mod summarize;
pub mod text_processing;
