mod pdf_adapter;

pub use pdf_adapter::PdfTextExtractor;
