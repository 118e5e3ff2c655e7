use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::cleanup::{CleanupOperation, CommandCleanup};
use crate::config::Config;
use crate::error::{LaunchError, ServeError};
use crate::keepalive::KeepAliveGuard;
use crate::launcher::{launch, Application, CommandApplication};
use crate::preparer::{CommandPreparer, EnvironmentPreparer};
use crate::server::{self, FallbackContext};

/// Rungs of the failure containment ladder. Each one is entered at most once, and only
/// because the one above it failed; the failure is carried down as the tier's value.
#[derive(Debug)]
pub enum Tier {
    Launching,
    Degraded(LaunchError),
    KeepAlive(ServeError),
}

impl Tier {
    pub fn name(&self) -> &'static str {
        match self {
            Tier::Launching => "launching",
            Tier::Degraded(_) => "degraded",
            Tier::KeepAlive(_) => "keepalive",
        }
    }
}

pub struct Supervisor {
    preparer: Arc<dyn EnvironmentPreparer>,
    application: Arc<dyn Application>,
    cleanup: Arc<dyn CleanupOperation>,
    bind: String,
    cleanup_timeout: Option<Duration>,
    keepalive_interval: Duration,
}

impl Supervisor {
    pub fn new(config: &Config) -> Self {
        Self {
            preparer: Arc::new(CommandPreparer::new(config.prepare_commands())),
            application: Arc::new(CommandApplication::new(config.app_command.clone())),
            cleanup: Arc::new(CommandCleanup::new(config.cleanup_command.clone())),
            bind: config.bind(),
            cleanup_timeout: config.cleanup_timeout(),
            keepalive_interval: config.keepalive_interval(),
        }
    }

    pub fn with_preparer(mut self, preparer: Arc<dyn EnvironmentPreparer>) -> Self {
        self.preparer = preparer;
        self
    }

    pub fn with_application(mut self, application: Arc<dyn Application>) -> Self {
        self.application = application;
        self
    }

    pub fn with_cleanup(mut self, cleanup: Arc<dyn CleanupOperation>) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Prepare the environment, then walk down the tiers. Only returns if the primary
    /// application ran and finished on its own; every other path ends in a tier that runs
    /// until the process is terminated.
    pub async fn run(self) {
        self.preparer.prepare().await;

        let mut tier = Tier::Launching;
        loop {
            info!("entering {} tier", tier.name());
            metrics::counter!("supervisor_tier_entered_total", "tier" => tier.name())
                .increment(1);

            tier = match tier {
                Tier::Launching => match self.launch().await {
                    Ok(()) => {
                        info!("primary application exited normally");
                        return;
                    }
                    Err(e) => Tier::Degraded(e),
                },
                Tier::Degraded(startup_error) => {
                    Tier::KeepAlive(self.degrade(startup_error).await)
                }
                Tier::KeepAlive(serve_error) => match self.keep_alive(serve_error).await {},
            }
        }
    }

    pub async fn launch(&self) -> Result<(), LaunchError> {
        launch(self.application.clone()).await.map_err(|e| {
            error!("primary application failed to start ({}): {}", e.kind(), e);
            e
        })
    }

    /// Bind and run the degraded server. Returns only once it cannot serve any more.
    pub async fn degrade(&self, startup_error: LaunchError) -> ServeError {
        match server::bind(&self.bind).await {
            Ok(listener) => self.serve_degraded(startup_error, listener).await,
            Err(e) => {
                error!("even the fallback server failed: {}", e);
                e
            }
        }
    }

    pub async fn serve_degraded(
        &self,
        startup_error: LaunchError,
        listener: TcpListener,
    ) -> ServeError {
        warn!("starting fallback server after launch failure: {}", startup_error);

        let context = FallbackContext::new(startup_error.to_string(), self.cleanup.clone())
            .with_cleanup_timeout(self.cleanup_timeout);

        let shutdown = std::future::pending();
        let serve_error = match server::serve(Arc::new(context), listener, shutdown).await {
            Ok(()) => ServeError::Stopped,
            Err(e) => e,
        };
        error!("fallback server exited: {}", serve_error);
        serve_error
    }

    pub async fn keep_alive(&self, serve_error: ServeError) -> Infallible {
        warn!("keeping the process alive for inspection after: {}", serve_error);
        KeepAliveGuard::new(self.keepalive_interval).run().await
    }
}
