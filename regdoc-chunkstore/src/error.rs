//! Error taxonomy for the chunk store and retriever (§7).

use thiserror::Error;

/// Errors raised by chunking, storage, and retrieval operations.
#[derive(Debug, Error)]
pub enum ChunkStoreError {
    /// An embedding did not have the configured dimension `D`.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension provided.
        actual: usize,
    },

    /// The persistence backend could not be reached or committed to.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A document or chunk id did not resolve to a stored record.
    #[error("not found: {0}")]
    NotFound(String),

    /// A stored record failed to (de)serialize.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem I/O failed while preparing the persistence path.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for chunk-store operations.
pub type Result<T> = std::result::Result<T, ChunkStoreError>;
