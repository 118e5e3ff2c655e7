use std::convert::Infallible;
use std::time::Duration;

use chrono::Utc;
use tracing::info;

/// Last resort when even the degraded server cannot run: keep the process (and the
/// container) alive so it can be inspected, logging a heartbeat every interval.
pub struct KeepAliveGuard {
    interval: Duration,
}

impl KeepAliveGuard {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub async fn run(self) -> Infallible {
        info!("entering keep-alive loop, heartbeat every {:?}", self.interval);

        loop {
            tokio::time::sleep(self.interval).await;
            metrics::counter!("supervisor_keepalive_heartbeats_total").increment(1);
            info!("still alive at {}", Utc::now().to_rfc3339());
        }
    }
}
