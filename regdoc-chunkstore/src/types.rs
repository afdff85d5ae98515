//! Persisted data model (component C6's schema, §3).

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use regdoc_extract::MimeKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Free-form key/value metadata attached to documents.
pub type DocumentMetadata = BTreeMap<String, String>;

/// The document's regulatory classification, used only for prompt framing
/// and filtering; it does not change how a document is chunked or indexed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentClass {
    /// A binding regulation or statute.
    Regulation,
    /// An internal policy document.
    Policy,
    /// Any other document.
    Document,
}

impl DocumentClass {
    /// Parses a class from its wire string, defaulting to `Document` for
    /// anything unrecognized, matching the upload endpoint's documented default.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "regulation" => Self::Regulation,
            "policy" => Self::Policy,
            _ => Self::Document,
        }
    }

    /// Wire string for this class.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regulation => "regulation",
            Self::Policy => "policy",
            Self::Document => "document",
        }
    }
}

impl Default for DocumentClass {
    fn default() -> Self {
        Self::Document
    }
}

/// A document ingested into the store. Never mutated after creation; a
/// change requires delete-then-reingest (§3 Lifecycle).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    /// Opaque identity.
    pub id: Uuid,
    /// Original filename as uploaded.
    pub filename: String,
    /// Path of the stored binary, `<STORAGE_PATH>/<id>/<filename>`.
    pub stored_path: PathBuf,
    /// Size of the stored binary in bytes.
    pub byte_size: u64,
    /// MIME kind as classified at upload time.
    pub mime_kind: MimeKind,
    /// Regulatory classification.
    pub document_class: DocumentClass,
    /// Commit time of the ingestion transaction.
    pub uploaded_at: DateTime<Utc>,
    /// Free-form metadata.
    pub metadata: DocumentMetadata,
}

/// The recognized chunk metadata keys (§3). Unknown keys are accepted and
/// carried in `extra`; known keys are typed so readers never need to parse
/// a free-form blob.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Human-visible page number when recoverable, else `physical_position`.
    pub page: u32,
    /// True iff `page` was recovered from page content rather than position.
    pub page_extracted: bool,
    /// 1-based physical page index in the source PDF (or logical section
    /// index for DOCX/text).
    pub physical_position: u32,
    /// Detected section or article title, when one was found.
    pub section: Option<String>,
    /// Denormalized parent document filename, for prompt assembly without a
    /// join back to the `documents` table.
    pub document_name: String,
    /// Any additional keys present on read, preserved but not interpreted.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

/// A chunk of a document's text: the unit of retrieval.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Chunk {
    /// Opaque identity.
    pub id: Uuid,
    /// Owning document.
    pub document_id: Uuid,
    /// 0-based ordinal within the document; dense, gap-free across a
    /// document's chunk set (§3 invariant).
    pub chunk_index: u32,
    /// UTF-8 text content, non-empty, trimmed.
    pub content: String,
    /// Token count under the canonical tokenizer.
    pub token_count: u32,
    /// Dense embedding vector of fixed dimension `D`.
    pub embedding: Vec<f32>,
    /// Recognized and passthrough metadata.
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Content hash used for the store's optional deduplication index.
    #[must_use]
    pub fn content_hash(&self) -> u64 {
        crate::dedup::content_hash(&self.content)
    }
}

/// A chunk paired with its retrieval score, as returned by ANN search and by
/// the retriever (C9) after reranking/filtering.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScoredChunk {
    /// The chunk.
    pub chunk: Chunk,
    /// Similarity or normalized rerank score (higher is better).
    pub score: f32,
}

/// Entry persisted in the ANN index: a chunk with its raw embedding, kept
/// separately so the index can be rebuilt without touching document/chunk
/// tables directly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexEntry {
    /// The chunk (embedding included).
    pub chunk: Chunk,
}

impl IndexEntry {
    /// Wraps a chunk as an index entry.
    #[must_use]
    pub const fn new(chunk: Chunk) -> Self {
        Self { chunk }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_class_round_trips() {
        assert_eq!(DocumentClass::parse("regulation"), DocumentClass::Regulation);
        assert_eq!(DocumentClass::parse("policy"), DocumentClass::Policy);
        assert_eq!(DocumentClass::parse("document"), DocumentClass::Document);
        assert_eq!(DocumentClass::parse("anything-else"), DocumentClass::Document);
        assert_eq!(DocumentClass::Regulation.as_str(), "regulation");
    }
}
