//! Retrieval pipeline (component C9, §4.9): ANN recall, reranking,
//! thresholding, and per-document diversity selection.

use std::time::Instant;

use regdoc_core::Reranker;
use uuid::Uuid;

use crate::config::RetrievalConfig;
use crate::error::Result;
use crate::store::ChunkStore;
use crate::types::ScoredChunk;

/// Per-stage wall-clock timings for one retrieval call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RetrievalTimings {
    pub recall_ms: u64,
    pub rerank_ms: u64,
    pub total_ms: u64,
}

/// Final ranked passages plus the metadata the answer composer needs to
/// decide how to caveat the response.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    /// Selected chunks in final rank order, each with its normalized score.
    pub results: Vec<ScoredChunk>,
    /// True if reranking was unavailable or every candidate was rejected by
    /// the threshold and a forced top-1 fallback applied.
    pub degraded: bool,
    pub timings: RetrievalTimings,
}

/// Runs the full retrieval pipeline against `store`.
///
/// `reranker` is `None` in fallback mode: candidates are scored by ANN
/// cosine similarity directly and `RERANK_THRESHOLD` is not applied, per
/// §4.9 stage 3.
///
/// # Errors
/// Returns a storage error if the ANN search itself fails (e.g. a dimension
/// mismatch between `query_vector` and the store).
pub async fn retrieve<R: Reranker>(
    store: &ChunkStore,
    reranker: Option<&R>,
    question: &str,
    query_vector: &[f32],
    config: &RetrievalConfig,
) -> Result<RetrievalOutcome> {
    let total_start = Instant::now();

    let recall_start = Instant::now();
    let candidates = store.search(query_vector, config.initial_top_k, 0.0)?;
    let recall_ms = elapsed_ms(recall_start);

    if candidates.is_empty() {
        return Ok(RetrievalOutcome {
            results: Vec::new(),
            degraded: false,
            timings: RetrievalTimings {
                recall_ms,
                rerank_ms: 0,
                total_ms: elapsed_ms(total_start),
            },
        });
    }

    let rerank_start = Instant::now();
    let (mut scored, mut degraded) = match reranker {
        Some(reranker) => match score_with_reranker(reranker, question, &candidates).await {
            Ok(scores) => (scores, false),
            Err(_) => (score_with_similarity(&candidates), true),
        },
        None => (score_with_similarity(&candidates), true),
    };
    let rerank_ms = elapsed_ms(rerank_start);

    if !degraded {
        let before = scored.len();
        scored.retain(|s| s.score >= config.rerank_threshold);
        if scored.is_empty() && before > 0 {
            let mut fallback = score_with_similarity(&candidates);
            fallback.truncate(1);
            scored = fallback;
            degraded = true;
        }
    }

    sort_with_tiebreak(&mut scored, &candidates);

    let results = if config.enforce_diversity {
        select_diverse(scored, config.max_per_doc, config.top_k_results)
    } else {
        scored.into_iter().take(config.top_k_results).collect()
    };

    Ok(RetrievalOutcome {
        results,
        degraded,
        timings: RetrievalTimings {
            recall_ms,
            rerank_ms,
            total_ms: elapsed_ms(total_start),
        },
    })
}

fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

async fn score_with_reranker<R: Reranker>(
    reranker: &R,
    question: &str,
    candidates: &[ScoredChunk],
) -> regdoc_core::Result<Vec<ScoredChunk>> {
    let passages: Vec<&str> = candidates.iter().map(|c| c.chunk.content.as_str()).collect();
    let raw_scores = reranker.rerank(question, &passages).await?;

    let min = raw_scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = raw_scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    let normalized: Vec<f32> = if (max - min).abs() < f32::EPSILON {
        raw_scores.iter().map(|_| 1.0).collect()
    } else {
        raw_scores.iter().map(|&s| (s - min) / (max - min)).collect()
    };

    Ok(candidates
        .iter()
        .zip(normalized)
        .map(|(c, score)| ScoredChunk {
            chunk: c.chunk.clone(),
            score,
        })
        .collect())
}

fn score_with_similarity(candidates: &[ScoredChunk]) -> Vec<ScoredChunk> {
    candidates.to_vec()
}

fn sort_with_tiebreak(scored: &mut [ScoredChunk], _candidates: &[ScoredChunk]) {
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (a.chunk.document_id, a.chunk.chunk_index).cmp(&(b.chunk.document_id, b.chunk.chunk_index)))
    });
}

fn select_diverse(ranked: Vec<ScoredChunk>, max_per_doc: usize, top_k: usize) -> Vec<ScoredChunk> {
    use std::collections::HashMap;

    let mut per_doc_count: HashMap<Uuid, usize> = HashMap::new();
    let mut selected = Vec::new();
    let mut taken = vec![false; ranked.len()];

    // Pass A: breadth, one chunk per distinct document.
    for (idx, candidate) in ranked.iter().enumerate() {
        if selected.len() >= top_k {
            break;
        }
        let doc_id = candidate.chunk.document_id;
        if per_doc_count.contains_key(&doc_id) {
            continue;
        }
        per_doc_count.insert(doc_id, 1);
        selected.push(candidate.clone());
        taken[idx] = true;
    }

    // Pass B: depth, fill remaining slots up to the per-document cap.
    for (idx, candidate) in ranked.iter().enumerate() {
        if selected.len() >= top_k {
            break;
        }
        if taken[idx] {
            continue;
        }
        let doc_id = candidate.chunk.document_id;
        let count = per_doc_count.entry(doc_id).or_insert(0);
        if *count < max_per_doc {
            *count += 1;
            selected.push(candidate.clone());
            taken[idx] = true;
        }
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChunkStoreConfig;
    use crate::types::{Chunk, ChunkMetadata, Document, DocumentClass};
    use chrono::Utc;
    use std::path::PathBuf;
    use tempfile::tempdir;

    struct StubReranker {
        scores: Vec<f32>,
    }

    impl Reranker for StubReranker {
        async fn rerank(&self, _question: &str, passages: &[&str]) -> regdoc_core::Result<Vec<f32>> {
            Ok(self.scores.iter().copied().take(passages.len()).collect())
        }
    }

    struct FailingReranker;

    impl Reranker for FailingReranker {
        async fn rerank(&self, _question: &str, _passages: &[&str]) -> regdoc_core::Result<Vec<f32>> {
            Err(regdoc_core::Error::msg("reranker unavailable"))
        }
    }

    fn make_document(name: &str) -> Document {
        Document {
            id: Uuid::new_v4(),
            filename: name.to_string(),
            stored_path: PathBuf::from(format!("/tmp/{name}")),
            byte_size: 10,
            mime_kind: regdoc_extract::MimeKind::Pdf,
            document_class: DocumentClass::Regulation,
            uploaded_at: Utc::now(),
            metadata: std::collections::BTreeMap::new(),
        }
    }

    fn make_chunk(document_id: Uuid, index: u32, content: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            document_id,
            chunk_index: index,
            content: content.to_string(),
            token_count: 3,
            embedding,
            metadata: ChunkMetadata {
                document_name: "doc.pdf".to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn reranker_normalizes_and_orders_by_score() {
        let dir = tempdir().unwrap();
        let config = ChunkStoreConfig::new(dir.path().join("store.redb"), 4);
        let store = ChunkStore::open(&config).unwrap();

        let document = make_document("doc.pdf");
        let chunks = vec![
            make_chunk(document.id, 0, "low relevance", vec![1.0, 0.0, 0.0, 0.0]),
            make_chunk(document.id, 1, "high relevance", vec![0.0, 1.0, 0.0, 0.0]),
        ];
        store.ingest(document, chunks).unwrap();

        let reranker = StubReranker { scores: vec![0.1, 0.9] };
        let outcome = retrieve(&store, Some(&reranker), "question", &[0.5, 0.5, 0.0, 0.0], &RetrievalConfig::default())
            .await
            .unwrap();

        assert!(!outcome.degraded);
        assert_eq!(outcome.results.len(), 2);
        assert_eq!(outcome.results[0].chunk.content, "high relevance");
        assert!((outcome.results[0].score - 1.0).abs() < f32::EPSILON);
        assert!((outcome.results[1].score - 0.0).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn reranker_failure_degrades_to_similarity_scoring() {
        let dir = tempdir().unwrap();
        let config = ChunkStoreConfig::new(dir.path().join("store.redb"), 4);
        let store = ChunkStore::open(&config).unwrap();

        let document = make_document("doc.pdf");
        let chunks = vec![make_chunk(document.id, 0, "content", vec![1.0, 0.0, 0.0, 0.0])];
        store.ingest(document, chunks).unwrap();

        let outcome =
            retrieve(&store, Some(&FailingReranker), "question", &[1.0, 0.0, 0.0, 0.0], &RetrievalConfig::default())
                .await
                .unwrap();

        assert!(outcome.degraded);
        assert_eq!(outcome.results.len(), 1);
    }

    #[tokio::test]
    async fn diversity_cap_limits_chunks_per_document() {
        let dir = tempdir().unwrap();
        let config = ChunkStoreConfig::new(dir.path().join("store.redb"), 4);
        let store = ChunkStore::open(&config).unwrap();

        let doc_a = make_document("a.pdf");
        let doc_b = make_document("b.pdf");
        let mut chunks = Vec::new();
        for i in 0..5 {
            chunks.push(make_chunk(doc_a.id, i, "a content", vec![1.0, 0.0, 0.0, 0.0]));
        }
        store.ingest(doc_a, chunks).unwrap();
        store.ingest(doc_b, vec![make_chunk(doc_b.id, 0, "b content", vec![1.0, 0.0, 0.0, 0.0])]).unwrap();

        let mut retrieval_config = RetrievalConfig::default();
        retrieval_config.max_per_doc = 2;
        retrieval_config.top_k_results = 10;
        retrieval_config.initial_top_k = 10;

        let reranker = StubReranker { scores: vec![0.9, 0.8, 0.7, 0.6, 0.5, 0.4] };
        let outcome =
            retrieve(&store, Some(&reranker), "q", &[1.0, 0.0, 0.0, 0.0], &retrieval_config).await.unwrap();

        let a_count = outcome.results.iter().filter(|r| r.chunk.content == "a content").count();
        assert!(a_count <= 2);
    }

    #[tokio::test]
    async fn empty_store_yields_empty_results() {
        let dir = tempdir().unwrap();
        let config = ChunkStoreConfig::new(dir.path().join("store.redb"), 4);
        let store = ChunkStore::open(&config).unwrap();

        let outcome: RetrievalOutcome =
            retrieve(&store, None::<&StubReranker>, "q", &[1.0, 0.0, 0.0, 0.0], &RetrievalConfig::default())
                .await
                .unwrap();
        assert!(outcome.results.is_empty());
        assert!(!outcome.degraded);
    }
}
