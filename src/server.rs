//! HTTP upload server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/` | Static upload form |
//! | `POST` | `/upload` | Multipart upload (field `file`) of a PDF |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Responses
//!
//! A processed upload returns `200`:
//!
//! ```json
//! { "message": "File uploaded and processed successfully", "hash": "9f86d0…", "pages": 12 }
//! ```
//!
//! Rejected uploads return `400` with a one-line reason; unexpected failures
//! (disk, unparseable PDF) return `500` in the same shape:
//!
//! ```json
//! { "error": "File already uploaded" }
//! ```

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        DefaultBodyLimit, Multipart, State,
    },
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::upload::{process_upload, UploadError, UploadOutcome};

const INDEX_HTML: &str = include_str!("../templates/index.html");

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
}

/// Builds the application router for `config`.
///
/// Exposed separately from [`run_server`] so callers can serve it on a
/// listener they bind themselves.
pub fn router(config: Arc<Config>) -> Router {
    let body_limit = config.server.max_upload_bytes;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handle_index))
        .route("/upload", post(handle_upload))
        .route("/health", get(handle_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { config })
}

/// Starts the upload server on `[server].bind` and runs until the process
/// is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let bind_addr = config.server.bind.clone();
    let app = router(Arc::new(config.clone()));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("upload server listening on http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.message,
            }),
        )
            .into_response()
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        if err.is_client_error() {
            return AppError {
                status: StatusCode::BAD_REQUEST,
                message: err.to_string(),
            };
        }
        tracing::error!("upload failed: {:#}", err);
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Internal server error".to_string(),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

// ============ GET / ============

async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /upload ============

#[derive(Serialize)]
struct UploadResponse {
    message: String,
    hash: String,
    pages: usize,
}

impl From<UploadOutcome> for UploadResponse {
    fn from(outcome: UploadOutcome) -> Self {
        UploadResponse {
            message: "File uploaded and processed successfully".to_string(),
            hash: outcome.hash,
            pages: outcome.pages,
        }
    }
}

/// Handler for `POST /upload`.
///
/// Reads the first multipart file part named `file` and runs the upload
/// pipeline on a blocking thread (hashing and PDF parsing are synchronous).
/// A request that is not multipart, or whose `file` field is plain text,
/// carries no file part.
async fn handle_upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart.map_err(|_| UploadError::MissingFile)?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field.bytes().await?;
        upload = Some((filename, bytes.to_vec()));
        break;
    }

    let (filename, bytes) = upload.ok_or(UploadError::MissingFile)?;

    let config = state.config.clone();
    let outcome = tokio::task::spawn_blocking(move || process_upload(&config, &filename, &bytes))
        .await
        .map_err(|e| UploadError::Internal(e.into()))??;

    Ok(Json(outcome.into()))
}
