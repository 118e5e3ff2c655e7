use std::process::Stdio;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::command::{shell, trimmed_output};

/// One-shot environment setup run before the primary application is launched.
/// Failures are logged and otherwise ignored, the launch goes ahead regardless.
#[async_trait]
pub trait EnvironmentPreparer: Send + Sync {
    async fn prepare(&self);
}

pub struct CommandPreparer {
    commands: Vec<String>,
}

impl CommandPreparer {
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    /// Run a single step, returning whether it succeeded.
    pub async fn run_step(&self, command_line: &str) -> bool {
        info!("preparing environment: {}", command_line);

        let output = shell(command_line)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await;

        match output {
            Ok(output) if output.status.success() => {
                let stdout = trimmed_output(&output.stdout);
                if stdout.is_empty() {
                    info!("{} completed", command_line);
                } else {
                    info!("{} completed: {}", command_line, stdout);
                }
                true
            }
            Ok(output) => {
                warn!(
                    "{} failed with {}: {}",
                    command_line,
                    output.status,
                    trimmed_output(&output.stderr)
                );
                false
            }
            Err(e) => {
                warn!("{} could not be started: {}", command_line, e);
                false
            }
        }
    }
}

#[async_trait]
impl EnvironmentPreparer for CommandPreparer {
    async fn prepare(&self) {
        let mut failed = 0;
        for command_line in &self.commands {
            if !self.run_step(command_line).await {
                failed += 1;
            }
        }
        if failed > 0 {
            warn!(
                "{} of {} preparation steps failed, continuing",
                failed,
                self.commands.len()
            );
        }
    }
}
