//! Cross-encoder reranker gateway (component C4).
//!
//! A reranker scores a `(query, passage)` pair jointly, which is more accurate
//! than comparing separately-computed embeddings but too expensive to run over
//! a whole corpus — it is applied only to the candidates an ANN search already
//! narrowed down.

use alloc::vec::Vec;
use core::future::Future;

/// Scores query/passage pairs for relevance.
///
/// Raw scores are real-valued and unbounded in sign; callers are responsible
/// for any normalization (see the retriever's min-max rule).
pub trait Reranker: Send + Sync {
    /// Scores `passages` against `query`, returning one raw score per passage
    /// in the same order.
    fn rerank(
        &self,
        query: &str,
        passages: &[&str],
    ) -> impl Future<Output = crate::Result<Vec<f32>>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct LengthReranker;

    impl Reranker for LengthReranker {
        #[allow(clippy::cast_precision_loss)]
        async fn rerank(&self, query: &str, passages: &[&str]) -> crate::Result<Vec<f32>> {
            Ok(passages
                .iter()
                .map(|p| {
                    let overlap = p.split_whitespace().filter(|w| query.contains(w)).count();
                    overlap as f32
                })
                .collect())
        }
    }

    #[tokio::test]
    async fn scores_align_with_input_order() {
        let reranker = LengthReranker;
        let scores = reranker
            .rerank("capital ratio", &["capital requirement", "unrelated text"])
            .await
            .unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores[0] > scores[1]);
    }
}
