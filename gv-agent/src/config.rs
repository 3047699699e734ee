//! Run configuration
//!
//! Per-field resolution priority: CLI flag, then environment variable, then
//! TOML config file, then compiled default. The resolved `AgentConfig` is
//! built once at startup and passed down; nothing reads configuration
//! ambiently after that.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;
use serde::Deserialize;

use crate::{Error, Result};

pub const DEFAULT_WATCH_DIR: &str = "images";
pub const DEFAULT_API_URL: &str = "http://localhost:8000/predict";
pub const DEFAULT_THRESHOLD: f64 = 0.8;
pub const DEFAULT_REVIEW_DIR: &str = "for_review";
pub const DEFAULT_RESULTS_DIR: &str = "results";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Command-line arguments for gv-agent
///
/// Every setting is optional here; `AgentConfig::resolve` fills in the TOML
/// and default tiers. The ENV tier is handled by clap's `env` attributes,
/// so CLI and ENV arrive already merged.
#[derive(Parser, Debug, Default)]
#[command(name = "gv-agent")]
#[command(about = "Image prediction agent: watch a directory, upload, triage")]
#[command(version)]
pub struct CliArgs {
    /// Directory to watch for images
    #[arg(long, env = "GV_WATCH_DIR")]
    pub watch_dir: Option<PathBuf>,

    /// Model API predict endpoint
    #[arg(long, env = "GV_API_URL")]
    pub api_url: Option<String>,

    /// Confidence threshold below which results go to review
    #[arg(long, env = "GV_THRESHOLD")]
    pub threshold: Option<f64>,

    /// Where to store low-confidence results
    #[arg(long, env = "GV_REVIEW_DIR")]
    pub review_dir: Option<PathBuf>,

    /// Where to store all prediction outputs
    #[arg(long, env = "GV_RESULTS_DIR")]
    pub results_dir: Option<PathBuf>,

    /// Upload request timeout in seconds
    #[arg(long, env = "GV_REQUEST_TIMEOUT")]
    pub request_timeout: Option<u64>,

    /// Only scan existing files and exit; do not watch for new ones
    #[arg(long, env = "GV_NO_WATCH")]
    pub no_watch: bool,

    /// Path to a TOML config file
    #[arg(long, env = "GV_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Optional overrides loaded from a TOML config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub watch_dir: Option<PathBuf>,
    pub api_url: Option<String>,
    pub threshold: Option<f64>,
    pub review_dir: Option<PathBuf>,
    pub results_dir: Option<PathBuf>,
    pub request_timeout_secs: Option<u64>,
    pub no_watch: Option<bool>,
}

impl TomlConfig {
    /// Load overrides from an explicit path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Cannot parse config file {}: {}", path.display(), e))
        })
    }

    /// Platform config file path (`~/.config/guardvision/config.toml` on
    /// Linux), if one exists.
    pub fn default_path() -> Option<PathBuf> {
        let path = dirs::config_dir()?.join("guardvision").join("config.toml");
        path.exists().then_some(path)
    }
}

/// Fully resolved run configuration.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub watch_dir: PathBuf,
    pub api_url: String,
    pub threshold: f64,
    pub review_dir: PathBuf,
    pub results_dir: PathBuf,
    pub request_timeout: Duration,
    /// Whether to keep listening for new files after the startup scan.
    pub watch: bool,
}

impl AgentConfig {
    /// Resolve each setting with CLI, ENV, TOML file, default priority.
    pub fn resolve(args: &CliArgs, file: &TomlConfig) -> Self {
        Self {
            watch_dir: args
                .watch_dir
                .clone()
                .or_else(|| file.watch_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_WATCH_DIR)),
            api_url: args
                .api_url
                .clone()
                .or_else(|| file.api_url.clone())
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            threshold: args
                .threshold
                .or(file.threshold)
                .unwrap_or(DEFAULT_THRESHOLD),
            review_dir: args
                .review_dir
                .clone()
                .or_else(|| file.review_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_REVIEW_DIR)),
            results_dir: args
                .results_dir
                .clone()
                .or_else(|| file.results_dir.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_RESULTS_DIR)),
            request_timeout: Duration::from_secs(
                args.request_timeout
                    .or(file.request_timeout_secs)
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            watch: !(args.no_watch || file.no_watch.unwrap_or(false)),
        }
    }
}
