//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use std::path::PathBuf;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::JobError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Forbidden(String),
    /// A launchable task whose file is missing; the path is echoed back
    FileNotFound { message: String, path: PathBuf },
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, serde_json::json!({ "error": msg })),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, serde_json::json!({ "error": msg }))
            }
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, serde_json::json!({ "error": msg })),
            ApiError::FileNotFound { message, path } => {
                tracing::warn!("Task file missing: {}", path.display());
                (
                    StatusCode::NOT_FOUND,
                    serde_json::json!({ "error": message, "path": path.display().to_string() }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::InvalidRequest(msg) => ApiError::BadRequest(msg),
            JobError::Forbidden(_) => ApiError::Forbidden("Notebook not allowed".to_string()),
            JobError::TaskNotFound { path, .. } => ApiError::FileNotFound {
                message: "Notebook file not found on server".to_string(),
                path,
            },
            JobError::NotFound(_) => ApiError::NotFound("Job not found".to_string()),
            JobError::NoJobsForTask(_) => {
                ApiError::NotFound("No jobs for that notebook".to_string())
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
