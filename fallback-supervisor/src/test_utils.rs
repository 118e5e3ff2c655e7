use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::cleanup::{CleanupOperation, CleanupResult};
use crate::error::CleanupError;

/// Cleanup operation returning a canned result and recording the retention it was called with.
pub struct StubCleanup {
    result: CleanupResult,
    calls: Mutex<Vec<u64>>,
}

impl StubCleanup {
    pub fn new(result: CleanupResult) -> Self {
        Self {
            result,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn success() -> Self {
        Self::new(
            serde_json::from_value(json!({
                "status": "success",
                "timestamp": "T",
                "retention_hours_applied": 48,
            }))
            .unwrap(),
        )
    }

    pub fn calls(&self) -> Vec<u64> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CleanupOperation for StubCleanup {
    async fn run(&self, retention_hours: u64) -> Result<CleanupResult, CleanupError> {
        self.calls.lock().unwrap().push(retention_hours);
        Ok(self.result.clone())
    }
}

pub enum RaisingCleanup {
    Error,
    Panic,
}

#[async_trait]
impl CleanupOperation for RaisingCleanup {
    async fn run(&self, _retention_hours: u64) -> Result<CleanupResult, CleanupError> {
        match self {
            RaisingCleanup::Error => Err(CleanupError::Unavailable),
            RaisingCleanup::Panic => panic!("vector client blew up"),
        }
    }
}

pub struct SlowCleanup(pub Duration);

#[async_trait]
impl CleanupOperation for SlowCleanup {
    async fn run(&self, _retention_hours: u64) -> Result<CleanupResult, CleanupError> {
        tokio::time::sleep(self.0).await;
        Ok(serde_json::from_value(json!({"status": "success", "timestamp": "T"})).unwrap())
    }
}
