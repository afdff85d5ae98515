//! Wire types for the HTTP surface (§6).

use chrono::{DateTime, Utc};
use regdoc_chunkstore::Document;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `Document DTO`: `{id, name, size, uploaded_at, type}`.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDto {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub uploaded_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: &'static str,
}

impl From<&Document> for DocumentDto {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id,
            name: document.filename.clone(),
            size: document.byte_size,
            uploaded_at: document.uploaded_at,
            kind: document.mime_kind.as_str(),
        }
    }
}

/// Response body for `GET /api/health`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub documents_count: usize,
    pub chunks_count: usize,
}

/// Request body for `POST /api/chat/stream`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

/// One prior turn of conversation, carried as raw text only (§4.10).
#[derive(Debug, Clone, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// `Citation DTO`, emitted inside the `citations` event.
#[derive(Debug, Clone, Serialize)]
pub struct CitationDto {
    pub id: String,
    pub text: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// `{kind: "metrics", data: {...}}` payload (§4.10, field names fixed by design).
#[derive(Debug, Clone, Serialize, Default)]
pub struct MetricsDto {
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub estimated_cost: f64,
    pub citations_count: usize,
    pub average_normalized_score: f32,
    pub latency_ms: u64,
    pub degraded: bool,
}
