use std::sync::Arc;

use axum::{
    http::{StatusCode, Uri},
    routing::{get, post},
    Json, Router,
};
use common_metrics::track_metrics;
use serde::Serialize;

use super::{cleanup, health};
use crate::server::FallbackContext;

#[derive(Serialize, Debug)]
pub struct NotFound {
    error: &'static str,
    path: String,
}

/// Every unknown path, and every method a known path does not serve, gets the same 404.
pub async fn not_found(uri: Uri) -> (StatusCode, Json<NotFound>) {
    let path = uri
        .path_and_query()
        .map(|path| path.as_str())
        .unwrap_or_else(|| uri.path())
        .to_owned();

    (
        StatusCode::NOT_FOUND,
        Json(NotFound {
            error: "Not Found",
            path,
        }),
    )
}

pub fn app(context: Arc<FallbackContext>) -> Router {
    Router::new()
        .route(
            "/",
            get(health::degraded).head(health::head).fallback(not_found),
        )
        .route("/health", get(health::degraded).fallback(not_found))
        .route(
            "/api/cleanup/health",
            get(health::degraded).fallback(not_found),
        )
        .route(
            "/api/cleanup/status",
            get(cleanup::status).fallback(not_found),
        )
        .route("/api/cleanup", post(cleanup::trigger).fallback(not_found))
        .fallback(not_found)
        .layer(axum::middleware::from_fn(track_metrics))
        .with_state(context)
}
