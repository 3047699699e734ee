//! Service modules for the ingest, upload, and triage pipeline

pub mod agent_orchestrator;
pub mod confidence_extractor;
pub mod directory_watcher;
pub mod file_scanner;
pub mod triage_writer;
pub mod upload_client;

pub use agent_orchestrator::AgentOrchestrator;
pub use confidence_extractor::extract_max_confidence;
pub use directory_watcher::{DirectoryWatcher, EventSource};
pub use file_scanner::{is_image_file, ImageScanner};
pub use triage_writer::{TriageError, TriageOutcome, TriageWriter};
pub use upload_client::{UploadClient, UploadError};
