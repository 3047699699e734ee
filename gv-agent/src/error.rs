//! Error types for gv-agent

use thiserror::Error;

use crate::services::triage_writer::TriageError;
use crate::services::upload_client::UploadError;

/// Crate-level result type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the agent's components
#[derive(Debug, Error)]
pub enum Error {
    /// Upload failed after retries
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Result or review record could not be persisted
    #[error("Triage error: {0}")]
    Triage(#[from] TriageError),

    /// Filesystem watcher failed
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
