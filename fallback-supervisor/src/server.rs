use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::cleanup::{CleanupOperation, CleanupResult};
use crate::error::{CleanupError, ServeError};
use crate::handlers;
use crate::state::CleanupResultStore;

/// Everything the degraded server's handlers share for the lifetime of the process.
pub struct FallbackContext {
    /// Rendered launch failure, echoed on every health response.
    pub startup_error: String,
    pub results: Arc<CleanupResultStore>,
    cleanup: Arc<dyn CleanupOperation>,
    cleanup_timeout: Option<Duration>,
}

impl FallbackContext {
    pub fn new(startup_error: String, cleanup: Arc<dyn CleanupOperation>) -> Self {
        Self {
            startup_error,
            results: Arc::new(CleanupResultStore::new()),
            cleanup,
            cleanup_timeout: None,
        }
    }

    pub fn with_cleanup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.cleanup_timeout = timeout;
        self
    }

    /// Run one cleanup attempt and record its result.
    ///
    /// The attempt, including storing its result, lives on its own task: once started it
    /// completes and overwrites the stored result even if the caller goes away.
    pub async fn run_cleanup(&self, retention_hours: u64) -> CleanupResult {
        let operation = self.cleanup.clone();
        let results = self.results.clone();
        let timeout = self.cleanup_timeout;

        let attempt = tokio::spawn(async move {
            let result = match invoke_cleanup(operation, retention_hours, timeout).await {
                Ok(result) => {
                    info!("cleanup completed in fallback mode: {}", result.status);
                    result
                }
                Err(e) => {
                    error!("cleanup failed in fallback mode: {}", e);
                    CleanupResult::failed(format!("Cleanup failed in fallback mode: {}", e))
                }
            };

            common_metrics::inc(
                "fallback_cleanup_requests_total",
                &[("status", result.status.to_string())],
                1,
            );
            results.set(result.clone()).await;
            result
        });

        match attempt.await {
            Ok(result) => result,
            // Only happens when the runtime is shutting down under us.
            Err(e) => {
                error!("cleanup attempt did not complete: {}", e);
                CleanupResult::failed(format!("Cleanup failed in fallback mode: {}", e))
            }
        }
    }
}

/// Run the operation on a task of its own, so nothing it does can stall the server. A
/// panic, or running past the optional timeout, counts as the operation raising.
async fn invoke_cleanup(
    operation: Arc<dyn CleanupOperation>,
    retention_hours: u64,
    timeout: Option<Duration>,
) -> Result<CleanupResult, CleanupError> {
    let mut task = tokio::spawn(async move { operation.run(retention_hours).await });

    let joined = match timeout {
        None => task.await,
        Some(timeout) => match tokio::time::timeout(timeout, &mut task).await {
            Ok(joined) => joined,
            Err(_) => {
                task.abort();
                return Err(CleanupError::TimedOut(timeout));
            }
        },
    };

    joined.map_err(|e| CleanupError::Aborted(e.to_string()))?
}

pub async fn bind(bind: &str) -> Result<TcpListener, ServeError> {
    TcpListener::bind(bind)
        .await
        .map_err(|source| ServeError::Bind {
            bind: bind.to_owned(),
            source,
        })
}

/// Serve the degraded routes on an already bound listener until `shutdown` resolves.
pub async fn serve<F>(
    context: Arc<FallbackContext>,
    listener: TcpListener,
    shutdown: F,
) -> Result<(), ServeError>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        info!("fallback server ready on http://{}", addr);
    }
    info!("  GET  /health - health check");
    info!("  POST /api/cleanup - cleanup endpoint (fallback mode)");
    info!("  GET  /api/cleanup/status - cleanup status");

    axum::serve(listener, handlers::app(context))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(ServeError::Serve)
}
