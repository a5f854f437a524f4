//! API route handlers.
//!
//! Every `/api` response uses one envelope: `{"success": true, "data": ...}`
//! on success, `{"success": false, "error": "..."}` on failure.

use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, Path as AxumPath, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde_json::{Value, json};

use super::AppState;
use crate::Error;
use crate::commands::{self, UploadOptions};

pub const NO_FILE_MESSAGE: &str = "No file uploaded";

/// Multipart field carrying the story sheet.
const FILE_FIELD: &str = "file";

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/stories", get(get_stories))
        .route("/api/stories/analysis", get(get_analysis))
        .route("/api/stories/analyze", post(run_analysis))
        .route("/api/stories/by-project", get(get_by_project))
        .route("/api/stories/by-epic", get(get_by_epic))
        .route("/api/stories/:id", get(get_story))
        .route("/api/upload", post(upload))
        .route("/api/upload/validate", post(validate_upload))
}

/// Error response carrying a library error.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

/// HTTP status for a library error.
pub fn status_for(error: &Error) -> StatusCode {
    match error {
        Error::NotFound(_) | Error::NoUploads => StatusCode::NOT_FOUND,
        Error::InvalidInput(_)
        | Error::Validation(_)
        | Error::UnsupportedFormat(_)
        | Error::Csv(_)
        | Error::Spreadsheet(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(&self.0);
        if status.is_server_error() {
            tracing::error!(error = %self.0, "request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "request rejected");
        }

        let body = match self.0 {
            Error::Validation(errors) => json!({
                "success": false,
                "error": "Validation failed",
                "errors": errors,
            }),
            other => json!({ "success": false, "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult = Result<Json<Value>, ApiError>;

fn data<T: serde::Serialize>(value: T) -> Value {
    json!({ "success": true, "data": value })
}

/// Liveness check with build information
async fn health() -> Json<Value> {
    let version = commands::version();
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
        "version": version.version,
        "commit": version.commit,
    }))
}

/// All stories from the latest upload
async fn get_stories(State(state): State<AppState>) -> ApiResult {
    let storage = state.storage.lock().await;
    let list = commands::list_stories(&storage, None)?;
    Ok(Json(json!({
        "success": true,
        "data": list.stories,
        "sourceFile": list.source_file,
        "count": list.count,
    })))
}

/// Latest saved analysis
async fn get_analysis(State(state): State<AppState>) -> ApiResult {
    let storage = state.storage.lock().await;
    let stored = commands::report(&storage)?;
    Ok(Json(data(stored)))
}

/// Run the analysis job now
async fn run_analysis(State(state): State<AppState>) -> ApiResult {
    let storage = state.storage.lock().await;
    let run = commands::run_analysis(&storage, Utc::now())?;
    let mut body = data(run.analysis.analysis);
    body["message"] = json!("Analysis completed successfully");
    Ok(Json(body))
}

async fn get_by_project(State(state): State<AppState>) -> ApiResult {
    let storage = state.storage.lock().await;
    let grouped = commands::stories_by_project(&storage, None)?;
    Ok(Json(data(grouped.groups)))
}

async fn get_by_epic(State(state): State<AppState>) -> ApiResult {
    let storage = state.storage.lock().await;
    let grouped = commands::stories_by_epic(&storage, None)?;
    Ok(Json(data(grouped.groups)))
}

/// One story from the latest upload, by id
async fn get_story(State(state): State<AppState>, AxumPath(id): AxumPath<String>) -> ApiResult {
    let storage = state.storage.lock().await;
    let detail = commands::show_story(&storage, None, &id)?;
    Ok(Json(data(detail.story)))
}

/// Store, then analyze, an uploaded story sheet
async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult {
    let (file_name, bytes) = read_file_field(multipart).await?;
    let options = UploadOptions {
        max_bytes: state.max_upload_bytes,
        analyze: true,
    };

    let mut storage = state.storage.lock().await;
    let result = commands::upload_bytes(&mut storage, &bytes, &file_name, options, Utc::now())?;
    let mut body = data(result);
    body["message"] = json!("File uploaded and analyzed successfully");
    Ok(Json(body))
}

/// Validate a story sheet without storing it
async fn validate_upload(multipart: Result<Multipart, MultipartRejection>) -> ApiResult {
    let (file_name, bytes) = read_file_field(multipart).await?;
    let result = commands::validate_bytes(&bytes, &file_name)?;
    let mut body = data(result);
    body["message"] = json!("File is valid");
    Ok(Json(body))
}

/// Read the `file` part of a multipart body as (original file name, bytes).
async fn read_file_field(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(String, Vec<u8>), ApiError> {
    let Ok(mut multipart) = multipart else {
        return Err(Error::InvalidInput(NO_FILE_MESSAGE.to_string()).into());
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidInput(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidInput(e.body_text()))?;
        return Ok((file_name, bytes.to_vec()));
    }

    Err(Error::InvalidInput(NO_FILE_MESSAGE.to_string()).into())
}
