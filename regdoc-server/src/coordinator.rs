//! Ingestion coordinator (component C7, §4.7): extract, chunk, embed, and
//! commit a document atomically. Any failure rolls back the staged binary;
//! nothing becomes visible to the retriever until the final commit.

use std::path::PathBuf;

use regdoc_core::EmbeddingModel;
use regdoc_extract::MimeKind;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

/// Runs C1 → C2 → C3 → C6 for one uploaded document and returns the
/// committed [`regdoc_chunkstore::Document`].
///
/// # Errors
/// - [`ApiError::ExtractionFailed`] if the binary cannot be parsed.
/// - [`ApiError::IngestionYieldedNothing`] if chunking produced zero chunks.
/// - [`ApiError::UpstreamUnavailable`] if embedding fails after retries.
/// - [`ApiError::Internal`] for storage failures.
#[instrument(skip(state, bytes), fields(filename = %filename))]
pub async fn ingest_document(
    state: &AppState,
    bytes: Vec<u8>,
    filename: String,
    mime: MimeKind,
    class: regdoc_chunkstore::DocumentClass,
) -> Result<regdoc_chunkstore::Document, ApiError> {
    let document_id = Uuid::new_v4();
    let staged_dir = state.config().storage_path.join(document_id.to_string());
    let stored_path = staged_dir.join(&filename);

    if let Err(err) = stage_binary(&staged_dir, &stored_path, &bytes) {
        warn!(document_id = %document_id, error = %err, "failed to stage document binary");
        return Err(err.into());
    }

    match ingest_staged(state, document_id, &filename, &stored_path, bytes.len() as u64, mime, class, &bytes).await {
        Ok(document) => {
            info!(document_id = %document_id, "ingestion committed");
            Ok(document)
        }
        Err(err) => {
            warn!(document_id = %document_id, error = %err, "ingestion failed, rolling back staged binary");
            let _ = std::fs::remove_dir_all(&staged_dir);
            Err(err)
        }
    }
}

fn stage_binary(dir: &std::path::Path, path: &std::path::Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    std::fs::write(path, bytes)
}

#[allow(clippy::too_many_arguments)]
async fn ingest_staged(
    state: &AppState,
    document_id: Uuid,
    filename: &str,
    stored_path: &std::path::Path,
    byte_size: u64,
    mime: MimeKind,
    class: regdoc_chunkstore::DocumentClass,
    bytes: &[u8],
) -> Result<regdoc_chunkstore::Document, ApiError> {
    let extracted = regdoc_extract::extract(bytes, mime).map_err(ApiError::from)?;

    let drafts = regdoc_chunkstore::chunk(&extracted, filename, &state.config().chunk_store.chunking);
    if drafts.is_empty() {
        return Err(ApiError::IngestionYieldedNothing);
    }

    let texts: Vec<&str> = drafts.iter().map(|d| d.content.as_str()).collect();
    let embeddings = state
        .embedder()
        .embed_batch(&texts)
        .await
        .map_err(|err| ApiError::UpstreamUnavailable(err.to_string()))?;

    if embeddings.len() != drafts.len() {
        return Err(ApiError::UpstreamUnavailable("embedding count did not match chunk count".to_string()));
    }

    let chunks: Vec<regdoc_chunkstore::Chunk> = drafts
        .into_iter()
        .zip(embeddings)
        .enumerate()
        .map(|(index, (draft, embedding))| regdoc_chunkstore::Chunk {
            id: Uuid::new_v4(),
            document_id,
            chunk_index: u32::try_from(index).unwrap_or(u32::MAX),
            content: draft.content,
            token_count: draft.token_count,
            embedding,
            metadata: draft.metadata,
        })
        .collect();

    let document = regdoc_chunkstore::Document {
        id: document_id,
        filename: filename.to_string(),
        stored_path: PathBuf::from(stored_path),
        byte_size,
        mime_kind: mime,
        document_class: class,
        uploaded_at: chrono::Utc::now(),
        metadata: regdoc_chunkstore::DocumentMetadata::new(),
    };

    state.store().ingest(document.clone(), chunks).map_err(ApiError::from)?;
    Ok(document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;

    #[test]
    fn stage_binary_writes_file_under_document_directory() {
        let dir = tempfile::tempdir().unwrap();
        let staged_dir = dir.path().join("doc-id");
        let stored_path = staged_dir.join("report.txt");

        stage_binary(&staged_dir, &stored_path, b"hello").unwrap();

        let mut contents = String::new();
        std::fs::File::open(&stored_path).unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "hello");
    }
}
