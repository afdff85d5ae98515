//! Query planner (component C8, §4.8): HyDE expansion followed by embedding.

use regdoc_core::llm::Parameters;
use regdoc_core::{EmbeddingModel, LanguageModel};
use tracing::{instrument, warn};

use crate::state::AppState;

const HYDE_PROMPT_PREFIX: &str = "Write a 3-4 sentence hypothetical passage, as if excerpted from a \
formal regulatory or policy document, that would contain the answer to the following question. \
Do not answer the question directly or mention that it is hypothetical; write only the passage.\n\nQuestion: ";

/// Output of the planning stage: the retrieval query surface and its vector.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    /// The HyDE passage (or the raw question, in fallback) used to compute
    /// [`Self::query_vector`]. Retained for diagnostics only; reranking and
    /// the final prompt use the original question, not this text.
    pub expanded_text: String,
    pub query_vector: Vec<f32>,
    /// Set if HyDE expansion failed and the raw question was embedded instead.
    pub degraded: bool,
}

/// Expands `question` via HyDE and embeds the result (§4.8).
///
/// # Errors
/// Returns an error only if embedding itself fails; a failed expansion
/// degrades to embedding the raw question rather than failing the call.
#[instrument(skip(state, question))]
pub async fn plan(state: &AppState, question: &str) -> Result<QueryPlan, regdoc_core::Error> {
    let temperature = state.config().generation.temperature_expand;
    let parameters = Parameters::new(temperature, 250);

    let prompt = format!("{HYDE_PROMPT_PREFIX}{question}");
    let (expanded_text, degraded) = match state.llm().complete_short(&prompt, parameters).await {
        Ok(passage) if !passage.trim().is_empty() => (passage, false),
        Ok(_) => {
            warn!("HyDE expansion returned an empty passage, falling back to raw question");
            (question.to_string(), true)
        }
        Err(err) => {
            warn!(error = %err, "HyDE expansion failed, falling back to raw question");
            (question.to_string(), true)
        }
    };

    let query_vector = state.embedder().embed(&expanded_text).await?;

    Ok(QueryPlan {
        expanded_text,
        query_vector,
        degraded,
    })
}
