//! HTTP surface for DocuWhiz.
//!
//! The API lives under `/api`:
//!
//! - `POST /api/upload` – Multipart upload (field `file`). Extracts the document text and returns
//!   the `sessionId` to chat against (mirrored as `fileId`), plus `characters`, `contentDigest`,
//!   and `uploadedAt`.
//! - `POST /api/chat` – `{ "sessionId": ..., "message": ... }` (`fileId` is accepted as an alias).
//!   Returns `{ "answer": ... }`.
//! - `GET /api/metrics` – Upload and chat counters.
//! - `GET /api/commands` – Machine-readable catalog of these endpoints.
//!
//! [`create_app`] wraps the API with the compiled frontend, CORS, and the upload size limit.
//! Failures are returned as `{ "error": <kind>, "details": <message> }` with a status per kind.

use crate::config::Config;
use crate::orchestration::{ChatError, DocumentChatApi, DocumentUpload, UploadError};
use crate::session::SessionError;
use axum::{
    Json, Router,
    extract::{
        DefaultBodyLimit, Multipart, State,
        multipart::{MultipartError, MultipartRejection},
        rejection::JsonRejection,
    },
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};

/// Multipart field carrying the uploaded document.
const UPLOAD_FIELD: &str = "file";

/// Build the router exposing the `/api` endpoints (without the `/api` prefix).
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: DocumentChatApi + 'static,
{
    Router::new()
        .route("/upload", post(upload_document::<S>))
        .route("/chat", post(chat::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .route("/commands", get(get_commands))
        .with_state(service)
}

/// Build the full application: API under `/api`, the frontend everywhere else.
///
/// Unknown non-API paths resolve to `index.html` so client-side routes survive a reload.
pub fn create_app<S>(service: Arc<S>, config: &Config) -> Router
where
    S: DocumentChatApi + 'static,
{
    let index = config.static_dir.join("index.html");
    let frontend = ServeDir::new(&config.static_dir).fallback(ServeFile::new(index));

    let app = Router::new()
        .nest("/api", create_router(service))
        .fallback_service(frontend)
        .layer(DefaultBodyLimit::max(config.max_upload_bytes));

    match config.cors_allowed_origin.as_deref().map(cors_layer) {
        Some(Some(cors)) => app.layer(cors),
        _ => app,
    }
}

fn cors_layer(origin: &str) -> Option<CorsLayer> {
    let origin = match origin.parse::<HeaderValue>() {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(origin, error = %error, "Ignoring invalid CORS origin");
            return None;
        }
    };
    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::ORIGIN, header::CONTENT_TYPE])
            .expose_headers([header::CONTENT_LENGTH])
            .allow_credentials(true)
            .max_age(Duration::from_secs(12 * 60 * 60)),
    )
}

/// Success response for `POST /api/upload`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    message: &'static str,
    session_id: String,
    /// Same value as `session_id`, under the key the bundled frontend reads.
    file_id: String,
    characters: usize,
    content_digest: String,
    uploaded_at: String,
}

/// Accept a multipart upload, extract its text, and bind it to a session.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError>
where
    S: DocumentChatApi,
{
    let mut multipart = multipart.map_err(|rejection| {
        AppError::BadRequest(format!("Invalid multipart request: {}", rejection.body_text()))
    })?;
    let mut upload = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(UPLOAD_FIELD) {
            tracing::debug!(field = ?field.name(), "Skipping multipart field");
            continue;
        }
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.map_err(multipart_error)?;
        upload = Some(DocumentUpload {
            file_name,
            bytes: bytes.to_vec(),
        });
        break;
    }

    let upload = upload.ok_or_else(|| AppError::BadRequest("Document file required".into()))?;
    let outcome = service.upload_document(upload).await?;
    Ok(Json(UploadResponse {
        message: "Document uploaded and text extracted",
        file_id: outcome.session_id.clone(),
        session_id: outcome.session_id,
        characters: outcome.characters,
        content_digest: outcome.content_digest,
        uploaded_at: outcome.uploaded_at,
    }))
}

fn multipart_error(error: MultipartError) -> AppError {
    tracing::warn!(error = %error, "Failed to read multipart upload");
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(error.body_text())
    } else {
        AppError::BadRequest(format!("Invalid multipart data: {}", error.body_text()))
    }
}

/// Request body for `POST /api/chat`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChatRequest {
    /// Identifier returned by the upload endpoint.
    #[serde(alias = "fileId")]
    session_id: String,
    /// Question about the document.
    message: String,
}

/// Success response for `POST /api/chat`.
#[derive(Serialize)]
struct ChatResponse {
    answer: String,
}

/// Answer one question grounded in the session's document.
async fn chat<S>(
    State(service): State<Arc<S>>,
    request: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, AppError>
where
    S: DocumentChatApi,
{
    let Json(request) = request.map_err(|rejection| {
        AppError::BadRequest(format!("Invalid JSON: {}", rejection.body_text()))
    })?;
    let answer = service.chat(&request.session_id, &request.message).await?;
    Ok(Json(ChatResponse { answer }))
}

/// Return upload/chat counters.
async fn get_metrics<S>(State(service): State<Arc<S>>) -> Json<crate::metrics::MetricsSnapshot>
where
    S: DocumentChatApi,
{
    Json(service.metrics_snapshot())
}

/// Descriptor for a single command in the discovery catalog.
#[derive(Serialize)]
struct CommandDescriptor {
    name: &'static str,
    method: &'static str,
    path: &'static str,
    description: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    request_example: Option<serde_json::Value>,
}

/// Response body for `GET /api/commands`.
#[derive(Serialize)]
struct CommandsResponse {
    commands: Vec<CommandDescriptor>,
}

/// Enumerate supported HTTP commands for discovery.
async fn get_commands() -> Json<CommandsResponse> {
    Json(CommandsResponse {
        commands: vec![
            CommandDescriptor {
                name: "upload",
                method: "POST",
                path: "/api/upload",
                description: "Multipart upload of a document in the `file` field. Extracts its text and returns { \"sessionId\": string }.",
                request_example: None,
            },
            CommandDescriptor {
                name: "chat",
                method: "POST",
                path: "/api/chat",
                description: "Ask a question about an uploaded document. Returns { \"answer\": string }.",
                request_example: Some(json!({
                    "sessionId": "3f0c7e8e-52a4-4b8e-9a53-0f7a1f3d8c11",
                    "message": "What is the total?"
                })),
            },
            CommandDescriptor {
                name: "metrics",
                method: "GET",
                path: "/api/metrics",
                description: "Return upload and chat counters plus the live session count.",
                request_example: None,
            },
        ],
    })
}

/// Error surfaced by the HTTP handlers.
enum AppError {
    BadRequest(String),
    PayloadTooLarge(String),
    Upload(UploadError),
    Chat(ChatError),
}

impl AppError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            Self::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large"),
            Self::Upload(UploadError::Storage { .. }) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "storage_failure")
            }
            Self::Upload(UploadError::Extraction(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "extraction_failure")
            }
            Self::Upload(UploadError::Session(SessionError::InvalidId)) => {
                (StatusCode::BAD_REQUEST, "invalid_session")
            }
            Self::Upload(UploadError::Session(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "session_failure")
            }
            Self::Chat(ChatError::EmptyMessage) => (StatusCode::BAD_REQUEST, "empty_message"),
            Self::Chat(ChatError::NoContext(_)) => (StatusCode::BAD_REQUEST, "no_context"),
            Self::Chat(ChatError::GenerationFailure(_)) => {
                (StatusCode::BAD_GATEWAY, "generation_failure")
            }
            Self::Chat(ChatError::EmptyGeneration) => (StatusCode::BAD_GATEWAY, "empty_generation"),
        }
    }

    fn details(&self) -> String {
        match self {
            Self::BadRequest(message) | Self::PayloadTooLarge(message) => message.clone(),
            Self::Upload(error) => error.to_string(),
            Self::Chat(error) => error.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        let body = Json(json!({ "error": kind, "details": self.details() }));
        (status, body).into_response()
    }
}

impl From<UploadError> for AppError {
    fn from(inner: UploadError) -> Self {
        Self::Upload(inner)
    }
}

impl From<ChatError> for AppError {
    fn from(inner: ChatError) -> Self {
        Self::Chat(inner)
    }
}
