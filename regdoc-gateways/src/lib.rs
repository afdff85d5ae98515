//! HTTP clients for the three external models the retrieval pipeline talks
//! to: embeddings (C3), reranking (C4), and chat completion (C5).
//!
//! Each client implements the corresponding `regdoc-core` trait over
//! `reqwest`, with a shared bounded-retry policy (see [`retry`]) for
//! transient transport failures.

mod embedding;
pub mod error;
mod llm;
mod reranker;
mod retry;

pub use embedding::EmbeddingGateway;
pub use error::{EmbeddingError, LlmError, RerankerError};
pub use llm::LlmGateway;
pub use reranker::RerankerGateway;
