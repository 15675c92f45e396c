//! Health Check API Handler
//!
//! Liveness endpoints for monitoring and for the frontend's first request.

use axum::{Json, http::StatusCode, response::IntoResponse};

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /api/
pub async fn banner() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Notebook job API is running. POST /api/run_notebook to begin."
    }))
}
