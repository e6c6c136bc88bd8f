use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::Form;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tower_http::trace::TraceLayer;
use tracing::info;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{Result, PolydubError};
use crate::job::{JobFlags, JobRequest, JobStatus};
use crate::jobs::JobManager;

#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<JobManager>,
}

/// Form payload for POST /translate. `languages` accepts repeated fields.
#[derive(Debug, Deserialize)]
pub struct TranslateForm {
    #[serde(default)]
    pub source_url: String,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub subtitles: bool,
    #[serde(default)]
    pub dubbed_audio: bool,
    #[serde(default)]
    pub preserve_original: bool,
}

#[derive(Serialize)]
struct SubmitResponse {
    job_id: Uuid,
    status: &'static str,
}

#[derive(Serialize)]
struct StatusResponse {
    job_id: Uuid,
    #[serde(flatten)]
    status: JobStatus,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/translate", post(submit_job))
        .route("/jobs/:job_id", get(job_status))
        .route("/download/:job_id/:filename", get(download_artifact))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: &ServerConfig, state: AppState) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("HTTP boundary listening on {}", config.bind_addr);
    axum::serve(listener, build_router(state, config.max_body_bytes)).await?;
    Ok(())
}

/// Accept a translation request. Validation failures are rejected with 400
/// before any file or directory work; accepted jobs return their id
/// immediately and run on the worker pool.
async fn submit_job(State(state): State<AppState>, Form(form): Form<TranslateForm>) -> Response {
    let request = JobRequest {
        source_url: form.source_url,
        languages: form.languages,
        flags: JobFlags {
            subtitles: form.subtitles,
            dubbed: form.dubbed_audio,
            preserve_original: form.preserve_original,
        },
    };

    match state.manager.submit(request).await {
        Ok(job_id) => (
            StatusCode::OK,
            Json(SubmitResponse {
                job_id,
                status: "queued",
            }),
        )
            .into_response(),
        Err(e @ PolydubError::Validation(_)) => {
            error_response(StatusCode::BAD_REQUEST, e.to_string())
        }
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn job_status(State(state): State<AppState>, Path(job_id): Path<String>) -> Response {
    let Ok(id) = Uuid::parse_str(&job_id) else {
        return error_response(StatusCode::NOT_FOUND, "unknown job id".to_string());
    };

    match state.manager.status(&id).await {
        Some(status) => (StatusCode::OK, Json(StatusResponse { job_id: id, status })).into_response(),
        None => error_response(StatusCode::NOT_FOUND, "unknown job id".to_string()),
    }
}

/// Stream a produced artifact as an attachment; 404 when absent.
async fn download_artifact(
    State(state): State<AppState>,
    Path((job_id, filename)): Path<(String, String)>,
) -> Response {
    let Ok(id) = Uuid::parse_str(&job_id) else {
        return error_response(StatusCode::NOT_FOUND, "unknown job id".to_string());
    };

    if !is_safe_filename(&filename) {
        return error_response(StatusCode::BAD_REQUEST, "invalid filename".to_string());
    }

    let path = state.manager.job_dir(&id).join(&filename);
    match tokio::fs::File::open(&path).await {
        Ok(file) => {
            let stream = ReaderStream::new(file);
            let body = axum::body::Body::from_stream(stream);
            let headers = [
                (
                    header::CONTENT_TYPE,
                    "application/octet-stream".to_string(),
                ),
                (
                    header::CONTENT_DISPOSITION,
                    format!("attachment; filename=\"{}\"", filename),
                ),
            ];
            (headers, body).into_response()
        }
        Err(_) => error_response(StatusCode::NOT_FOUND, "artifact not found".to_string()),
    }
}

/// Artifact names never contain separators or parent components; anything
/// else is a traversal attempt.
fn is_safe_filename(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\') && !name.contains("..")
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(ErrorBody { error: message })).into_response()
}
