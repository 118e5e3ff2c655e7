use std::fmt;
use std::process::Stdio;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::command::{shell, trimmed_output};
use crate::error::CleanupError;

/// Status of the last cleanup attempt. Statuses this service does not know about are kept
/// verbatim so they can be reported back exactly as the operation produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CleanupStatus {
    NeverRun,
    Success,
    Error,
    Other(String),
}

impl CleanupStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, CleanupStatus::Success)
    }

    pub fn as_str(&self) -> &str {
        match self {
            CleanupStatus::NeverRun => "never_run",
            CleanupStatus::Success => "success",
            CleanupStatus::Error => "error",
            CleanupStatus::Other(status) => status,
        }
    }
}

impl From<String> for CleanupStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "never_run" => CleanupStatus::NeverRun,
            "success" => CleanupStatus::Success,
            "error" => CleanupStatus::Error,
            _ => CleanupStatus::Other(status),
        }
    }
}

impl From<CleanupStatus> for String {
    fn from(status: CleanupStatus) -> Self {
        match status {
            CleanupStatus::Other(status) => status,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for CleanupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a cleanup attempt, as reported on the status endpoint.
///
/// Only `status` is interpreted. Everything else the operation reports (timestamp, message,
/// deleted counts, durations...) is kept in `fields` and serialized back untouched, whatever
/// its JSON type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupResult {
    pub status: CleanupStatus,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CleanupResult {
    /// The placeholder result served until a cleanup request completes.
    pub fn never_run() -> Self {
        Self::with_fields(
            CleanupStatus::NeverRun,
            Value::Null,
            "Cleanup has not been executed yet".to_owned(),
        )
    }

    /// A result recording that the operation could not be run to completion.
    pub fn failed(message: String) -> Self {
        Self::with_fields(
            CleanupStatus::Error,
            Value::String(now_timestamp()),
            message,
        )
    }

    fn with_fields(status: CleanupStatus, timestamp: Value, message: String) -> Self {
        let mut fields = Map::new();
        fields.insert("timestamp".to_owned(), timestamp);
        fields.insert("message".to_owned(), Value::String(message));
        Self { status, fields }
    }

    pub fn timestamp(&self) -> Option<&Value> {
        self.fields.get("timestamp")
    }

    pub fn message(&self) -> Option<&str> {
        self.fields.get("message").and_then(Value::as_str)
    }
}

pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339()
}

/// Purges data older than the retention window. Owned by the primary application, called
/// directly by the degraded server while that application is down.
#[async_trait]
pub trait CleanupOperation: Send + Sync {
    async fn run(&self, retention_hours: u64) -> Result<CleanupResult, CleanupError>;
}

/// Runs the primary application's cleanup entrypoint as a shell command.
///
/// The retention window is passed in the `RETENTION_HOURS` environment variable and the
/// command must print its `CleanupResult` as JSON on stdout.
pub struct CommandCleanup {
    command: Option<String>,
}

impl CommandCleanup {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl CleanupOperation for CommandCleanup {
    async fn run(&self, retention_hours: u64) -> Result<CleanupResult, CleanupError> {
        let command_line = self.command.as_deref().ok_or(CleanupError::Unavailable)?;

        let output = shell(command_line)
            .env("RETENTION_HOURS", retention_hours.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(CleanupError::Spawn)?;

        if !output.status.success() {
            return Err(CleanupError::Exited {
                status: output.status,
                stderr: trimmed_output(&output.stderr),
            });
        }

        Ok(serde_json::from_slice(&output.stdout)?)
    }
}
