use eyre::Result;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

use fallback_supervisor::config::Config;
use fallback_supervisor::supervisor::Supervisor;

async fn shutdown() {
    let signals = signal(SignalKind::terminate())
        .and_then(|term| Ok((term, signal(SignalKind::interrupt())?)));

    match signals {
        Ok((mut term, mut interrupt)) => {
            tokio::select! {
                _ = term.recv() => {},
                _ = interrupt.recv() => {},
            };
            info!("Shutting down gracefully...");
        }
        Err(e) => {
            // The default signal disposition still terminates the process.
            error!("failed to register signal handlers: {}", e);
            std::future::pending::<()>().await
        }
    }
}

async fn serve_metrics(bind: String) -> Result<()> {
    let recorder_handle = common_metrics::setup_metrics_recorder()?;
    let router = common_metrics::setup_metrics_router(recorder_handle);
    common_metrics::serve(router, &bind).await?;
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::load();

    if let Some(bind) = config.metrics_bind() {
        tokio::spawn(async move {
            if let Err(e) = serve_metrics(bind).await {
                error!("failed to start serving metrics: {}", e);
            }
        });
    }

    let supervisor = Supervisor::new(&config);

    tokio::select! {
        _ = supervisor.run() => {
            info!("supervisor finished, exiting");
        }
        _ = shutdown() => {}
    }
}
