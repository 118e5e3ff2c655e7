use std::num::NonZeroU64;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::cleanup::{now_timestamp, CleanupResult};
use crate::server::FallbackContext;

pub const DEFAULT_RETENTION_HOURS: u64 = 24;

#[derive(Deserialize, Debug)]
struct CleanupRequest {
    retention_hours: Option<NonZeroU64>,
}

#[derive(Serialize, Debug)]
pub struct HandlerFailure {
    error: String,
    timestamp: String,
}

/// Effective retention window for a cleanup request body. Anything short of a JSON object
/// with a positive integer `retention_hours` falls back to the default, never to an error.
pub fn retention_hours(body: &[u8]) -> u64 {
    match serde_json::from_slice::<CleanupRequest>(body) {
        Ok(CleanupRequest {
            retention_hours: Some(hours),
        }) => hours.get(),
        Ok(_) => DEFAULT_RETENTION_HOURS,
        // An empty body is the normal way to ask for the default.
        Err(_) if body.is_empty() => DEFAULT_RETENTION_HOURS,
        Err(e) => {
            warn!(
                "unusable cleanup request body, using {} hours: {}",
                DEFAULT_RETENTION_HOURS, e
            );
            DEFAULT_RETENTION_HOURS
        }
    }
}

pub async fn status(State(context): State<Arc<FallbackContext>>) -> Json<CleanupResult> {
    Json(context.results.get().await)
}

pub async fn trigger(
    State(context): State<Arc<FallbackContext>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(e) => {
            error!("error reading cleanup request: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HandlerFailure {
                    error: e.body_text(),
                    timestamp: now_timestamp(),
                }),
            )
                .into_response();
        }
    };

    let retention_hours = retention_hours(&body);
    info!(
        "received cleanup request in fallback mode (retention: {} hours)",
        retention_hours
    );

    // Already stored by the time it comes back.
    let result = context.run_cleanup(retention_hours).await;

    let status = if result.status.is_success() {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(result)).into_response()
}
