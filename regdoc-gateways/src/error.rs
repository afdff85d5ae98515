//! Transport error taxonomy for the gateway crate (§7).

use thiserror::Error;

/// Errors surfaced by the embedding gateway after its retry policy is
/// exhausted.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding gateway unavailable: {0}")]
    Unavailable(String),

    #[error("embedding response malformed: {0}")]
    MalformedResponse(String),
}

/// Errors surfaced by the reranker gateway. The retriever treats any of
/// these as a trigger for degraded (similarity-only) mode.
#[derive(Debug, Error)]
pub enum RerankerError {
    #[error("reranker gateway unavailable: {0}")]
    Unavailable(String),

    #[error("reranker response malformed: {0}")]
    MalformedResponse(String),
}

/// Errors surfaced by the chat-completion gateway.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("language model gateway unavailable: {0}")]
    Unavailable(String),

    #[error("language model stream truncated: {0}")]
    StreamTruncated(String),

    #[error("language model response malformed: {0}")]
    MalformedResponse(String),
}
