//! gv-probe - One-shot upload smoke test
//!
//! Sends a single image to the predict endpoint (one attempt, no retry),
//! prints the JSON response, and saves it for inspection. Useful for
//! checking endpoint health before pointing the agent at a live camera
//! directory.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use gv_agent::config::DEFAULT_API_URL;
use gv_agent::services::UploadClient;

/// Command-line arguments for gv-probe
#[derive(Parser, Debug)]
#[command(name = "gv-probe")]
#[command(about = "Send one image to the predict endpoint and save the response")]
#[command(version)]
struct Args {
    /// Image file to upload
    image: PathBuf,

    /// Model API predict endpoint
    #[arg(long, env = "GV_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Where to save the JSON response
    #[arg(long, default_value = "result.json")]
    output: PathBuf,

    /// Upload request timeout in seconds
    #[arg(long, default_value_t = 30)]
    request_timeout: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    anyhow::ensure!(
        args.image.is_file(),
        "Image not found: {}",
        args.image.display()
    );

    let client = UploadClient::new(
        args.api_url.clone(),
        Duration::from_secs(args.request_timeout),
    )
    .context("Failed to create upload client")?;

    let response = client
        .send(&args.image)
        .await
        .with_context(|| format!("Upload failed for {}", args.image.display()))?;

    let body = serde_json::to_string_pretty(&response)?;
    std::fs::write(&args.output, &body)
        .with_context(|| format!("Cannot write {}", args.output.display()))?;

    info!(output = %args.output.display(), "Prediction saved");
    println!("{}", body);

    Ok(())
}
