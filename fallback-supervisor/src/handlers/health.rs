use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;

use crate::cleanup::now_timestamp;
use crate::server::FallbackContext;

#[derive(Serialize, Debug)]
pub struct DegradedHealth {
    status: &'static str,
    message: &'static str,
    timestamp: String,
    error: String,
    fix_attempted: bool,
    cleanup_api: &'static str,
}

/// Always healthy from the orchestrator's point of view: the process is up and the
/// cleanup endpoints work, even though the primary application is not running.
pub async fn degraded(State(context): State<Arc<FallbackContext>>) -> Json<DegradedHealth> {
    Json(DegradedHealth {
        status: "degraded",
        message: "Primary application failed to start - running fallback server",
        timestamp: now_timestamp(),
        error: context.startup_error.clone(),
        fix_attempted: true,
        cleanup_api: "available",
    })
}

pub async fn head() -> impl IntoResponse {
    (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")])
}
