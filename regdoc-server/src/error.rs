//! Top-level HTTP error type (§7): composes every component error into one
//! `ApiError` that implements axum's `IntoResponse`, mapping error kinds to
//! status codes and a JSON `{error, kind}` body.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Errors surfaced at the HTTP boundary.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad MIME, unsupported extension, or malformed request body.
    #[error("{0}")]
    InputRejected(String),

    /// Upload exceeded `MAX_UPLOAD_MB`.
    #[error("upload too large")]
    PayloadTooLarge,

    /// A document binary could not be parsed for its declared MIME kind.
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    /// A document produced zero chunks after extraction and chunking.
    #[error("document yielded no chunks")]
    IngestionYieldedNothing,

    /// Embedding, reranker, LLM, or storage transport failed after retries.
    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// A requested document or chunk id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other internal failure not classified above.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    kind: &'static str,
}

impl ApiError {
    const fn kind(&self) -> &'static str {
        match self {
            Self::InputRejected(_) => "input_rejected",
            Self::PayloadTooLarge => "payload_too_large",
            Self::ExtractionFailed(_) => "extraction_failed",
            Self::IngestionYieldedNothing => "empty_yield",
            Self::UpstreamUnavailable(_) => "upstream_unavailable",
            Self::NotFound(_) => "not_found",
            Self::Internal(_) => "internal",
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::InputRejected(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::ExtractionFailed(_) | Self::IngestionYieldedNothing => StatusCode::UNPROCESSABLE_ENTITY,
            Self::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.kind();
        let body = ErrorBody { error: self.to_string(), kind };
        (status, Json(body)).into_response()
    }
}

impl From<regdoc_chunkstore::ChunkStoreError> for ApiError {
    fn from(err: regdoc_chunkstore::ChunkStoreError) -> Self {
        use regdoc_chunkstore::ChunkStoreError as E;
        match err {
            E::NotFound(msg) => Self::NotFound(msg),
            E::StorageUnavailable(msg) => Self::UpstreamUnavailable(msg),
            E::DimensionMismatch { expected, actual } => {
                Self::Internal(format!("dimension mismatch: expected {expected}, got {actual}"))
            }
            E::Serialization(msg) => Self::Internal(msg),
            E::Io(err) => Self::Internal(err.to_string()),
        }
    }
}

impl From<regdoc_extract::ExtractError> for ApiError {
    fn from(err: regdoc_extract::ExtractError) -> Self {
        Self::ExtractionFailed(err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
