//! Triage persistence
//!
//! Every successfully uploaded image gets a result record; below-threshold
//! scores additionally get a review copy carrying the computed score. Record
//! identity is the image's base name without extension, so a later image
//! with the same base name overwrites the earlier record.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{json, Value};
use thiserror::Error;

/// Triage writer errors
#[derive(Debug, Error)]
pub enum TriageError {
    #[error("Cannot create output directory {0}: {1}")]
    DirectoryCreate(PathBuf, String),

    #[error("Cannot write record {0}: {1}")]
    RecordWrite(PathBuf, String),
}

/// Paths written for one processed image.
#[derive(Debug, Clone)]
pub struct TriageOutcome {
    pub result_path: PathBuf,
    pub review_path: Option<PathBuf>,
}

/// Persists prediction responses and routes low-confidence ones to review.
pub struct TriageWriter {
    results_dir: PathBuf,
    review_dir: PathBuf,
    threshold: f64,
}

impl TriageWriter {
    pub fn new(results_dir: PathBuf, review_dir: PathBuf, threshold: f64) -> Self {
        Self {
            results_dir,
            review_dir,
            threshold,
        }
    }

    /// Persist the record for one image, overwriting any prior record of
    /// the same base name. Output directories are created on demand.
    pub fn persist(
        &self,
        image_path: &Path,
        response: &Value,
        max_confidence: f64,
    ) -> Result<TriageOutcome, TriageError> {
        // The classifier guarantees scanned paths carry an extension, so a
        // stem is always present; the fallback never fires in practice.
        let file_name = match image_path.file_stem() {
            Some(stem) => format!("{}.json", stem.to_string_lossy()),
            None => "record.json".to_string(),
        };

        let record = json!({
            "image": image_path.display().to_string(),
            "response": response,
        });
        let result_path = self.results_dir.join(&file_name);
        write_record(&self.results_dir, &result_path, &record)?;

        let review_path = if max_confidence < self.threshold {
            let record = json!({
                "image": image_path.display().to_string(),
                "response": response,
                "max_confidence": max_confidence,
            });
            let review_path = self.review_dir.join(&file_name);
            write_record(&self.review_dir, &review_path, &record)?;
            Some(review_path)
        } else {
            None
        };

        Ok(TriageOutcome {
            result_path,
            review_path,
        })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }
}

/// Create the output directory if needed, then write the record as indented
/// JSON, replacing any existing file of that name.
fn write_record(dir: &Path, path: &Path, record: &Value) -> Result<(), TriageError> {
    fs::create_dir_all(dir)
        .map_err(|e| TriageError::DirectoryCreate(dir.to_path_buf(), e.to_string()))?;

    let body = serde_json::to_vec_pretty(record)
        .map_err(|e| TriageError::RecordWrite(path.to_path_buf(), e.to_string()))?;

    fs::write(path, body).map_err(|e| TriageError::RecordWrite(path.to_path_buf(), e.to_string()))
}
