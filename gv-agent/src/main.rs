//! gv-agent - Image prediction agent
//!
//! Watches a directory for newly created images, uploads each to the
//! configured inference endpoint, persists the JSON response, and routes
//! low-confidence predictions to a review directory for human inspection.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gv_agent::config::{AgentConfig, CliArgs, TomlConfig};
use gv_agent::services::{AgentOrchestrator, DirectoryWatcher, TriageWriter, UploadClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gv_agent=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = CliArgs::parse();

    let file_config = match args.config.clone().or_else(TomlConfig::default_path) {
        Some(path) => {
            info!(config = %path.display(), "Loading config file");
            TomlConfig::load(&path).context("Failed to load config file")?
        }
        None => TomlConfig::default(),
    };

    let config = AgentConfig::resolve(&args, &file_config);

    info!(
        watch_dir = %config.watch_dir.display(),
        api_url = %config.api_url,
        threshold = config.threshold,
        "Agent starting"
    );

    // A results directory that cannot be created is loud but not fatal:
    // later images may still succeed if the condition clears.
    if let Err(e) = std::fs::create_dir_all(&config.results_dir) {
        error!(
            results_dir = %config.results_dir.display(),
            error = %e,
            "Cannot create results directory"
        );
    }

    let upload_client = UploadClient::new(config.api_url.clone(), config.request_timeout)
        .context("Failed to create upload client")?;
    let triage_writer = TriageWriter::new(
        config.results_dir.clone(),
        config.review_dir.clone(),
        config.threshold,
    );
    let orchestrator = AgentOrchestrator::new(upload_client, triage_writer);

    let processed = orchestrator.scan_existing(&config.watch_dir).await;
    info!(processed, "Initial pass complete");

    if !config.watch {
        info!("Watching disabled; exiting after initial pass");
        return Ok(());
    }

    let watcher = DirectoryWatcher::new(&config.watch_dir).with_context(|| {
        format!(
            "Failed to watch directory {}",
            config.watch_dir.display()
        )
    })?;

    let processed = orchestrator.run_events(watcher, shutdown_signal()).await;
    info!(processed, "Event listener stopped");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
