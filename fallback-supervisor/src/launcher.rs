use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::command::shell;
use crate::error::LaunchError;

/// The primary application. `start` blocks for as long as the application runs, returning
/// `Ok` only when it finished on its own.
#[async_trait]
pub trait Application: Send + Sync {
    async fn start(&self) -> Result<(), LaunchError>;
}

/// Runs the primary application as a child process sharing our stdio.
pub struct CommandApplication {
    command: Option<String>,
}

impl CommandApplication {
    pub fn new(command: Option<String>) -> Self {
        Self { command }
    }
}

#[async_trait]
impl Application for CommandApplication {
    async fn start(&self) -> Result<(), LaunchError> {
        let command_line = self.command.as_deref().ok_or(LaunchError::NotConfigured)?;

        info!("starting primary application: {}", command_line);

        let mut child = shell(command_line)
            .kill_on_drop(true)
            .spawn()
            .map_err(LaunchError::Spawn)?;

        let status = child.wait().await.map_err(LaunchError::Spawn)?;
        if status.success() {
            Ok(())
        } else {
            Err(LaunchError::Exited(status))
        }
    }
}

/// Start the application on its own task, so that a panic while starting is captured as
/// a launch failure like any other.
pub async fn launch(application: Arc<dyn Application>) -> Result<(), LaunchError> {
    tokio::spawn(async move { application.start().await })
        .await
        .map_err(|e| LaunchError::Aborted(e.to_string()))?
}
