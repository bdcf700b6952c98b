//! Error types for the `quill-rag` crate.

use thiserror::Error;

/// Errors that can occur while ingesting documents or serving retrieval.
#[derive(Debug, Error)]
pub enum RagError {
    /// The uploaded file's extension is not one we can extract text from.
    #[error("unsupported file type: {extension}")]
    UnsupportedFileType {
        /// The offending extension, including its leading dot.
        extension: String,
    },

    /// Extraction succeeded but produced no usable text.
    #[error("no extractable text found")]
    NoExtractableText,

    /// The PDF parser rejected the file.
    #[error("PDF extraction failed: {0}")]
    PdfExtraction(String),

    /// Invalid construction parameters, raised before any document is processed.
    #[error("configuration error: {0}")]
    Config(String),

    /// Both the primary and the fallback embedding model failed to load.
    #[error("embedding model load failed: {0}")]
    ModelLoad(String),

    /// The loaded model failed to produce embeddings.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// A vector index operation failed.
    #[error("vector index error: {0}")]
    Index(String),
}

impl RagError {
    /// True for errors caused by the uploaded document itself. These are
    /// user-facing and recoverable: the UI reports them and lets the user
    /// retry with a different file.
    pub fn is_document_error(&self) -> bool {
        matches!(
            self,
            RagError::UnsupportedFileType { .. }
                | RagError::NoExtractableText
                | RagError::PdfExtraction(_)
        )
    }
}

/// A convenience result type for retrieval operations.
pub type Result<T> = std::result::Result<T, RagError>;
