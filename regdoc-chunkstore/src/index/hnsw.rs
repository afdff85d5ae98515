//! HNSW-based vector index using `instant-distance` (§4.6).

use std::collections::HashMap;

use instant_distance::{Builder, HnswMap, Point, Search};
use ordered_float::OrderedFloat;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::error::{ChunkStoreError, Result};
use crate::types::{Chunk, IndexEntry, ScoredChunk};

use super::VectorIndex;

#[derive(Clone, Debug)]
struct EmbeddingPoint {
    embedding: Vec<f32>,
}

impl Point for EmbeddingPoint {
    fn distance(&self, other: &Self) -> f32 {
        1.0 - cosine_similarity(&self.embedding, &other.embedding)
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut norm_a, mut norm_b) = (0.0f32, 0.0f32, 0.0f32);
    for (lhs, rhs) in a.iter().zip(b) {
        dot += lhs * rhs;
        norm_a += lhs * lhs;
        norm_b += rhs * rhs;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

struct IndexState {
    entries: Vec<IndexEntry>,
    id_to_index: HashMap<Uuid, usize>,
    content_hashes: HashMap<u64, Uuid>,
    hnsw: Option<HnswMap<EmbeddingPoint, usize>>,
    dirty: bool,
}

impl IndexState {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            id_to_index: HashMap::new(),
            content_hashes: HashMap::new(),
            hnsw: None,
            dirty: false,
        }
    }

    fn rebuild_hnsw(&mut self) {
        if self.entries.is_empty() {
            self.hnsw = None;
            self.dirty = false;
            return;
        }

        let points: Vec<EmbeddingPoint> = self
            .entries
            .iter()
            .map(|e| EmbeddingPoint {
                embedding: e.chunk.embedding.clone(),
            })
            .collect();
        let indices: Vec<usize> = (0..self.entries.len()).collect();

        self.hnsw = Some(Builder::default().build(points, indices));
        self.dirty = false;
    }
}

/// HNSW-backed cosine-similarity index. Rebuilds its graph lazily on the
/// next search after a mutation, so bursts of inserts pay the rebuild once.
pub struct HnswIndex {
    dimension: usize,
    state: RwLock<IndexState>,
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("HnswIndex")
            .field("dimension", &self.dimension)
            .field("len", &state.entries.len())
            .finish()
    }
}

impl HnswIndex {
    /// Creates an empty index fixed to `dimension`.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: RwLock::new(IndexState::new()),
        }
    }
}

impl VectorIndex for HnswIndex {
    fn insert(&self, chunk: Chunk) -> Result<()> {
        if chunk.embedding.len() != self.dimension {
            return Err(ChunkStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: chunk.embedding.len(),
            });
        }

        let mut state = self.state.write();
        let hash = chunk.content_hash();

        if let Some(&idx) = state.id_to_index.get(&chunk.id) {
            let old_hash = state.entries[idx].chunk.content_hash();
            state.content_hashes.remove(&old_hash);
            state.content_hashes.insert(hash, chunk.id);
            state.entries[idx] = IndexEntry::new(chunk);
        } else {
            let idx = state.entries.len();
            state.id_to_index.insert(chunk.id, idx);
            state.content_hashes.insert(hash, chunk.id);
            state.entries.push(IndexEntry::new(chunk));
        }

        state.dirty = true;
        Ok(())
    }

    fn remove(&self, chunk_id: Uuid) -> bool {
        let mut state = self.state.write();

        let Some(&idx) = state.id_to_index.get(&chunk_id) else {
            return false;
        };

        let hash = state.entries[idx].chunk.content_hash();
        state.content_hashes.remove(&hash);

        let removed = state.entries.swap_remove(idx);
        state.id_to_index.remove(&removed.chunk.id);

        if idx < state.entries.len() {
            let swapped_id = state.entries[idx].chunk.id;
            state.id_to_index.insert(swapped_id, idx);
        }

        state.dirty = true;
        true
    }

    fn search(&self, query: &[f32], top_k: usize, threshold: f32) -> Result<Vec<ScoredChunk>> {
        if query.len() != self.dimension {
            return Err(ChunkStoreError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut state = self.state.write();

        if state.entries.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        if state.dirty || state.hnsw.is_none() {
            state.rebuild_hnsw();
        }

        let Some(ref hnsw) = state.hnsw else {
            return Ok(Vec::new());
        };

        let query_point = EmbeddingPoint {
            embedding: query.to_vec(),
        };

        let mut search = Search::default();
        let mut results = Vec::new();

        for candidate in hnsw.search(&query_point, &mut search).take(top_k) {
            let idx = *candidate.value;
            let entry = &state.entries[idx];
            let similarity = 1.0 - candidate.distance;

            if similarity >= threshold {
                results.push(ScoredChunk {
                    chunk: entry.chunk.clone(),
                    score: similarity,
                });
            }
        }

        results.sort_by_key(|r| std::cmp::Reverse(OrderedFloat(r.score)));

        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    fn clear(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        state.id_to_index.clear();
        state.content_hashes.clear();
        state.hnsw = None;
        state.dirty = false;
    }

    fn entries(&self) -> Vec<IndexEntry> {
        self.state.read().entries.clone()
    }

    fn load(&self, entries: Vec<IndexEntry>) -> Result<()> {
        let mut state = self.state.write();

        state.entries.clear();
        state.id_to_index.clear();
        state.content_hashes.clear();

        for (idx, entry) in entries.into_iter().enumerate() {
            if entry.chunk.embedding.len() != self.dimension {
                return Err(ChunkStoreError::DimensionMismatch {
                    expected: self.dimension,
                    actual: entry.chunk.embedding.len(),
                });
            }
            state.id_to_index.insert(entry.chunk.id, idx);
            state.content_hashes.insert(entry.chunk.content_hash(), entry.chunk.id);
            state.entries.push(entry);
        }

        state.dirty = true;
        Ok(())
    }

    fn contains_hash(&self, hash: u64) -> bool {
        self.state.read().content_hashes.contains_key(&hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ChunkMetadata;

    fn make_chunk(text: &str) -> Chunk {
        Chunk {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            chunk_index: 0,
            content: text.to_string(),
            token_count: 2,
            embedding: Vec::new(),
            metadata: ChunkMetadata {
                document_name: "doc.txt".to_string(),
                ..Default::default()
            },
        }
    }

    fn make_chunk_with_embedding(text: &str, embedding: Vec<f32>) -> Chunk {
        let mut chunk = make_chunk(text);
        chunk.embedding = embedding;
        chunk
    }

    #[test]
    fn insert_and_search() {
        let index = HnswIndex::new(4);

        let chunk1 = make_chunk_with_embedding("hello", vec![1.0, 0.0, 0.0, 0.0]);
        let id1 = chunk1.id;
        let chunk2 = make_chunk_with_embedding("world", vec![0.0, 1.0, 0.0, 0.0]);

        index.insert(chunk1).unwrap();
        index.insert(chunk2).unwrap();

        assert_eq!(index.len(), 2);

        let results = index.search(&[1.0, 0.0, 0.0, 0.0], 1, 0.0).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.id, id1);
    }

    #[test]
    fn remove_entry() {
        let index = HnswIndex::new(4);

        let chunk = make_chunk_with_embedding("hello", vec![1.0, 0.0, 0.0, 0.0]);
        let id = chunk.id;
        index.insert(chunk).unwrap();

        assert_eq!(index.len(), 1);
        assert!(index.remove(id));
        assert_eq!(index.len(), 0);
        assert!(!index.remove(id));
    }

    #[test]
    fn update_existing_replaces_content() {
        let index = HnswIndex::new(4);

        let mut chunk1 = make_chunk_with_embedding("hello", vec![1.0, 0.0, 0.0, 0.0]);
        let id = chunk1.id;
        index.insert(chunk1.clone()).unwrap();

        chunk1.content = "world".to_string();
        chunk1.embedding = vec![0.0, 1.0, 0.0, 0.0];
        index.insert(chunk1).unwrap();

        assert_eq!(index.len(), 1);

        let results = index.search(&[0.0, 1.0, 0.0, 0.0], 1, 0.0).unwrap();
        assert_eq!(results[0].chunk.id, id);
        assert_eq!(results[0].chunk.content, "world");
    }

    #[test]
    fn dimension_mismatch() {
        let index = HnswIndex::new(4);
        let chunk = make_chunk_with_embedding("hello", vec![1.0, 0.0]);

        let result = index.insert(chunk);
        assert!(matches!(result, Err(ChunkStoreError::DimensionMismatch { .. })));
    }

    #[test]
    fn threshold_filtering() {
        let index = HnswIndex::new(4);

        index.insert(make_chunk_with_embedding("hello", vec![1.0, 0.0, 0.0, 0.0])).unwrap();
        index.insert(make_chunk_with_embedding("world", vec![0.0, 1.0, 0.0, 0.0])).unwrap();

        let results = index.search(&[1.0, 0.0, 0.0, 0.0], 10, 0.9).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn contains_hash_tracks_inserted_content() {
        let index = HnswIndex::new(4);
        let chunk = make_chunk_with_embedding("hello world", vec![1.0, 0.0, 0.0, 0.0]);
        let hash = chunk.content_hash();

        assert!(!index.contains_hash(hash));
        index.insert(chunk).unwrap();
        assert!(index.contains_hash(hash));
    }

    #[test]
    fn load_entries() {
        let index = HnswIndex::new(4);

        let chunk1 = make_chunk_with_embedding("hello", vec![1.0, 0.0, 0.0, 0.0]);
        let id1 = chunk1.id;
        let entries = vec![
            IndexEntry::new(chunk1),
            IndexEntry::new(make_chunk_with_embedding("world", vec![0.0, 1.0, 0.0, 0.0])),
        ];

        index.load(entries).unwrap();
        assert_eq!(index.len(), 2);

        let results = index.search(&[1.0, 0.0, 0.0, 0.0], 1, 0.0).unwrap();
        assert_eq!(results[0].chunk.id, id1);
    }

    #[test]
    fn clear_index() {
        let index = HnswIndex::new(4);

        index.insert(make_chunk_with_embedding("hello", vec![1.0, 0.0, 0.0, 0.0])).unwrap();

        assert_eq!(index.len(), 1);
        index.clear();
        assert_eq!(index.len(), 0);
        assert!(index.is_empty());
    }
}
