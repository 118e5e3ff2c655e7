use tokio::sync::RwLock;

use crate::cleanup::CleanupResult;

/// Holder for the last known cleanup result.
///
/// Handlers run concurrently, so readers get a snapshot and writers replace the whole
/// result at once: a status poll never observes a half written result.
#[derive(Debug)]
pub struct CleanupResultStore {
    last: RwLock<CleanupResult>,
}

impl CleanupResultStore {
    pub fn new() -> Self {
        Self {
            last: RwLock::new(CleanupResult::never_run()),
        }
    }

    pub async fn get(&self) -> CleanupResult {
        self.last.read().await.clone()
    }

    pub async fn set(&self, result: CleanupResult) {
        *self.last.write().await = result;
    }
}

impl Default for CleanupResultStore {
    fn default() -> Self {
        Self::new()
    }
}
