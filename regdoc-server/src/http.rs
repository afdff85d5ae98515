//! HTTP routes (§6): health, document upload/list/delete, and the
//! server-sent-events chat endpoint.

use axum::extract::{Multipart, Path, State};
use axum::response::sse::{KeepAlive, Sse};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use regdoc_extract::MimeKind;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::coordinator;
use crate::dto::{ChatRequest, DocumentDto, HealthResponse};
use crate::error::ApiError;
use crate::planner;
use crate::state::AppState;
use crate::{composer, retriever};

/// Builds the application router over `state`.
#[must_use]
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/documents/upload", post(upload_document))
        .route("/api/documents/", get(list_documents))
        .route("/api/documents/{id}", delete(delete_document))
        .route("/api/chat/stream", post(chat_stream))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        documents_count: state.store().count_documents(),
        chunks_count: state.store().count_chunks(),
    })
}

async fn list_documents(State(state): State<AppState>) -> impl IntoResponse {
    let documents: Vec<DocumentDto> = state.store().list_documents().iter().map(DocumentDto::from).collect();
    Json(documents)
}

async fn delete_document(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<impl IntoResponse, ApiError> {
    let existed = state.store().delete_document(id)?;
    if existed {
        Ok(axum::http::StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("document {id}")))
    }
}

async fn upload_document(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<DocumentDto>, ApiError> {
    let mut filename: Option<String> = None;
    let mut bytes: Option<Vec<u8>> = None;
    let mut mime: Option<MimeKind> = None;
    let mut class = regdoc_chunkstore::DocumentClass::Document;

    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::InputRejected(e.to_string()))? {
        match field.name() {
            Some("file") => {
                let name = field.file_name().unwrap_or("upload.bin").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(|e| ApiError::InputRejected(e.to_string()))?;

                let kind = MimeKind::detect(&content_type, &name).ok_or_else(|| ApiError::InputRejected(format!("unsupported MIME kind for {name}")))?;
                if !state.config().upload.extension_allowed(&name) {
                    return Err(ApiError::InputRejected(format!("extension not allowed for {name}")));
                }
                if data.len() as u64 > state.config().upload.max_upload_bytes() {
                    return Err(ApiError::PayloadTooLarge);
                }

                filename = Some(name);
                mime = Some(kind);
                bytes = Some(data.to_vec());
            }
            Some("class") => {
                let value = field.text().await.map_err(|e| ApiError::InputRejected(e.to_string()))?;
                class = regdoc_chunkstore::DocumentClass::parse(&value);
            }
            _ => {}
        }
    }

    let filename = filename.ok_or_else(|| ApiError::InputRejected("no file field in upload".to_string()))?;
    let bytes = bytes.ok_or_else(|| ApiError::InputRejected("no file field in upload".to_string()))?;
    let mime = mime.ok_or_else(|| ApiError::InputRejected("no file field in upload".to_string()))?;

    let document = coordinator::ingest_document(&state, bytes, filename, mime, class).await?;
    Ok(Json(DocumentDto::from(&document)))
}

async fn chat_stream(State(state): State<AppState>, Json(request): Json<ChatRequest>) -> Result<impl IntoResponse, ApiError> {
    let plan = planner::plan(&state, &request.message).await.map_err(|e| ApiError::UpstreamUnavailable(e.to_string()))?;

    let outcome = retriever::run(&state, &request.message, &plan.query_vector).await?;

    let average_normalized_score =
        if outcome.results.is_empty() { 0.0 } else { outcome.results.iter().map(|r| r.score).sum::<f32>() / outcome.results.len() as f32 };

    let stream = composer::compose(
        state,
        request.message,
        request.history,
        outcome.results,
        plan.degraded,
        outcome.degraded,
        average_normalized_score,
    );

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
