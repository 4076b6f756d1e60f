//! phplogwatch - Entry Point

use clap::Parser;
use phplogwatch::config::{load_watcher_config, resolve_config_path, ReloadingConfig};
use phplogwatch::enrich::Enricher;
use phplogwatch::model::error::AppError;
use phplogwatch::pipeline::Orchestrator;
use phplogwatch::preflight::check_dependencies;
use phplogwatch::sink::WebhookSink;
use phplogwatch::source::{LogTailer, TailTiming};
use std::path::PathBuf;
use std::time::Duration;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Watch a PHP error log and forward enriched error traces to a webhook
#[derive(Parser, Debug)]
#[command(name = "phplogwatch")]
#[command(version)]
#[command(about = "Watch a PHP/Apache error log and post enriched error traces to a webhook")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Seconds between configuration reloads (overrides reload_interval_secs)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub reload_interval: Option<u64>,

    /// Path to the watcher's own log file (overrides log_path)
    #[arg(long)]
    pub log_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    run(args).await.map_err(Into::into)
}

async fn run(args: Args) -> Result<(), AppError> {
    let config_path = resolve_config_path(args.config.clone());
    let initial = load_watcher_config(&config_path)?;
    let config = ReloadingConfig::new(
        &config_path,
        initial.clone(),
        args.reload_interval.map(Duration::from_secs),
    );

    let log_path = args.log_path.clone().unwrap_or_else(|| initial.log_path.clone());
    phplogwatch::logging::init(&log_path)?;

    info!(
        config_path = %config_path.display(),
        log_file = %initial.log_file.display(),
        enabled = initial.enabled,
        webhook_url = %initial.webhook_url,
        reload_interval = ?config.interval(),
        "Configuration loaded"
    );

    check_dependencies(&initial);

    let cancel = CancellationToken::new();
    let tailer = LogTailer::open(&initial.log_file, TailTiming::default(), cancel.clone())?;

    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, stopping watcher");
        cancel_on_signal.cancel();
    });

    let pipeline = tokio::task::spawn_blocking(move || {
        let sink = WebhookSink::new().map_err(AppError::HttpClient)?;
        let mut orchestrator = Orchestrator::new(config, Enricher::system(), sink);
        Ok::<_, AppError>(orchestrator.run(tailer, &cancel))
    });

    match pipeline.await? {
        Ok(stats) => {
            info!(
                received = stats.received,
                delivered = stats.delivered,
                skipped_disabled = stats.skipped_disabled,
                failed = stats.failed,
                "Watcher shutdown complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Watcher failed");
            Err(e)
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
