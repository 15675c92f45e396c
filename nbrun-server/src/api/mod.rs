//! API Module
//!
//! HTTP API layer for the server.
//! Each submodule handles endpoints for a specific concern.

pub mod error;
pub mod health;
pub mod job;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::service::JobService;

/// Create the main API router with all endpoints
pub fn create_router(service: JobService) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/api/", get(health::banner))
        // Job endpoints
        .route("/api/run_notebook", post(job::launch_job))
        .route("/api/notebook_status", get(job::get_job_status))
        // Add state and middleware
        .with_state(service)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
