#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use tokio::net::TcpListener;
use tokio::sync::Notify;

use fallback_supervisor::cleanup::{CleanupOperation, CleanupResult};
use fallback_supervisor::error::CleanupError;
use fallback_supervisor::server::{serve, FallbackContext};

pub struct ServerHandle {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
}

impl ServerHandle {
    pub async fn for_context(context: FallbackContext) -> ServerHandle {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let notify = Arc::new(Notify::new());
        let shutdown = notify.clone();

        tokio::spawn(async move {
            serve(Arc::new(context), listener, async move {
                notify.notified().await
            })
            .await
        });
        ServerHandle { addr, shutdown }
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        reqwest::Client::new()
            .get(format!("http://{:?}{}", self.addr, path))
            .send()
            .await
            .expect("failed to send request")
    }

    pub async fn post_cleanup<T: Into<reqwest::Body>>(&self, body: T) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("http://{:?}/api/cleanup", self.addr))
            .body(body)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .expect("failed to send request")
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.shutdown.notify_one()
    }
}

/// Cleanup operation answering from a script of results, one per call.
pub struct ScriptedCleanup {
    results: Mutex<Vec<Result<CleanupResult, CleanupError>>>,
    pub calls: Mutex<Vec<u64>>,
}

impl ScriptedCleanup {
    pub fn new(mut results: Vec<Result<CleanupResult, CleanupError>>) -> Self {
        results.reverse();
        Self {
            results: Mutex::new(results),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl CleanupOperation for ScriptedCleanup {
    async fn run(&self, retention_hours: u64) -> Result<CleanupResult, CleanupError> {
        self.calls.lock().unwrap().push(retention_hours);
        self.results
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(CleanupError::Unavailable))
    }
}

/// Cleanup operation that takes its time before succeeding.
pub struct SlowCleanup(pub Duration);

#[async_trait]
impl CleanupOperation for SlowCleanup {
    async fn run(&self, retention_hours: u64) -> Result<CleanupResult, CleanupError> {
        tokio::time::sleep(self.0).await;
        Ok(serde_json::from_value(serde_json::json!({
            "status": "success",
            "timestamp": "T",
            "retention_hours_applied": retention_hours,
        }))?)
    }
}

/// Find a port nothing listens on right now.
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}
