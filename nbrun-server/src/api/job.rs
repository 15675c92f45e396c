//! Job API Handlers
//!
//! HTTP endpoints for launching notebooks and polling their status.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use nbrun_core::dto::job::{JobStatusQuery, JobStatusResponse, LaunchJob, LaunchedJob};

use crate::api::error::{ApiError, ApiResult};
use crate::service::JobService;

/// POST /api/run_notebook
/// Launch a notebook in the background
///
/// The body is parsed as JSON whatever its content type.
pub async fn launch_job(
    State(service): State<JobService>,
    body: Bytes,
) -> ApiResult<Json<LaunchedJob>> {
    let req: LaunchJob = serde_json::from_slice(&body)
        .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;

    tracing::info!("Launching notebook: {:?}", req.name);

    let job_id = service.launch(req.name.as_deref())?;

    Ok(Json(LaunchedJob { job_id }))
}

/// GET /api/notebook_status
/// Get a job by `job_id`, or the latest job for a notebook by `name`
pub async fn get_job_status(
    State(service): State<JobService>,
    Query(query): Query<JobStatusQuery>,
) -> ApiResult<Json<JobStatusResponse>> {
    let status = service.query_status(&query)?;
    Ok(Json(status))
}
