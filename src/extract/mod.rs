//! Uploaded files and document text extraction
//!
//! - `UploadedFile`: raw file bytes plus name and mime type
//! - `ContentExtractor`: file -> plain text, injectable so tests can stub it
//! - `DocumentExtractor`: `.txt`, `.pdf` and `.docx` support

mod document;
mod file;

pub use document::{detect_format, DocumentExtractor, DocumentFormat};
pub use file::{title_from_filename, UploadedFile};

use async_trait::async_trait;

/// Errors surfaced to the user when a document cannot be read
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("Unsupported document type: .{0}. Please upload a .txt, .pdf, or .docx file.")]
    UnsupportedType(String),
    #[error("Failed to read document: {0}")]
    Failed(String),
}

/// Turns an uploaded document into plain text
#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, file: &UploadedFile) -> Result<String, ExtractError>;
}
