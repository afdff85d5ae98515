//! Thin wrapper around [`regdoc_chunkstore::retrieve`] binding it to this
//! process's chunk store, reranker gateway, and configured parameters.

use regdoc_chunkstore::RetrievalOutcome;

use crate::error::ApiError;
use crate::state::AppState;

/// Runs the retrieval pipeline (C9) for `question`/`query_vector` against
/// the shared store, using the configured reranker gateway.
///
/// # Errors
/// Returns an error only if the ANN search itself fails (e.g. a dimension
/// mismatch); reranker unavailability degrades rather than fails.
pub async fn run(state: &AppState, question: &str, query_vector: &[f32]) -> Result<RetrievalOutcome, ApiError> {
    regdoc_chunkstore::retrieve(state.store(), Some(state.reranker()), question, query_vector, &state.config().chunk_store.retrieval)
        .await
        .map_err(ApiError::from)
}
