use std::process::ExitStatus;
use std::time;

use thiserror::Error;

/// Why the primary application did not take over the process.
///
/// Every variant is handled the same way: the supervisor falls through to degraded mode and
/// renders the message into the health payloads.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("no primary application configured")]
    NotConfigured,
    #[error("failed to start primary application: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("primary application exited with {0}")]
    Exited(ExitStatus),
    #[error("primary application aborted: {0}")]
    Aborted(String),
}

impl LaunchError {
    /// Short name of the failure, logged next to the message.
    pub fn kind(&self) -> &'static str {
        match self {
            LaunchError::NotConfigured => "NotConfigured",
            LaunchError::Spawn(_) => "Spawn",
            LaunchError::Exited(_) => "Exited",
            LaunchError::Aborted(_) => "Aborted",
        }
    }
}

/// Errors raised while invoking the cleanup operation, as opposed to the operation
/// completing and reporting a non-success status.
#[derive(Error, Debug)]
pub enum CleanupError {
    #[error("cleanup operation unavailable")]
    Unavailable,
    #[error("failed to start cleanup command: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("cleanup command exited with {status}: {stderr}")]
    Exited { status: ExitStatus, stderr: String },
    #[error("cleanup command produced an invalid result: {0}")]
    InvalidOutput(#[from] serde_json::Error),
    #[error("cleanup operation timed out after {0:?}")]
    TimedOut(time::Duration),
    #[error("cleanup operation aborted: {0}")]
    Aborted(String),
}

/// Failures of the degraded http server, either binding its listener or serving on it.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("failed to bind {bind}: {source}")]
    Bind {
        bind: String,
        #[source]
        source: std::io::Error,
    },
    #[error("http server failed: {0}")]
    Serve(#[source] std::io::Error),
    #[error("http server stopped")]
    Stopped,
}
