use thiserror::Error;

/// Errors emitted by text extraction (component C1).
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The document binary could not be read or parsed for its declared MIME kind.
    #[error("failed to extract {mime}: {reason}")]
    ExtractionFailed {
        /// MIME kind the caller declared for the document.
        mime: &'static str,
        /// Human-readable cause.
        reason: String,
    },
    /// The document's MIME kind is not one of pdf, docx, text.
    #[error("unsupported document MIME kind: {0}")]
    UnsupportedMime(String),
    /// Underlying filesystem I/O failure.
    #[error("failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, ExtractError>;
