//! Ingestion orchestration
//!
//! Drives the per-image pipeline (classify, upload, score, persist) over
//! both discovery sources: the startup scan and live creation events.
//! Images are processed strictly one at a time; a failure is fatal to its
//! image only.

use std::future::Future;
use std::path::Path;

use crate::services::confidence_extractor::extract_max_confidence;
use crate::services::directory_watcher::EventSource;
use crate::services::file_scanner::{is_image_file, ImageScanner};
use crate::services::triage_writer::{TriageOutcome, TriageWriter};
use crate::services::upload_client::UploadClient;
use crate::Result;

/// Orchestrates the end-to-end pipeline for one agent run.
pub struct AgentOrchestrator {
    scanner: ImageScanner,
    upload_client: UploadClient,
    triage_writer: TriageWriter,
}

impl AgentOrchestrator {
    pub fn new(upload_client: UploadClient, triage_writer: TriageWriter) -> Self {
        Self {
            scanner: ImageScanner::new(),
            upload_client,
            triage_writer,
        }
    }

    /// Run the pipeline for a single image.
    ///
    /// Upload failures surface as errors after the client's internal
    /// retries; a failed image leaves no record and no partial files.
    pub async fn process_image(&self, image_path: &Path) -> Result<TriageOutcome> {
        tracing::info!(image = %image_path.display(), "Processing image");

        let response = self.upload_client.predict(image_path).await?;
        let max_confidence = extract_max_confidence(&response);

        tracing::info!(
            image = %image_path.display(),
            max_confidence,
            "Prediction received"
        );

        let outcome = self
            .triage_writer
            .persist(image_path, &response, max_confidence)?;

        if let Some(review_path) = &outcome.review_path {
            tracing::info!(
                review = %review_path.display(),
                "Saved low-confidence result for review"
            );
        }

        Ok(outcome)
    }

    /// Process every image already present in the watch directory, in
    /// sorted-name order. Per-image failures are logged and skipped.
    /// Returns the number of images processed successfully.
    pub async fn scan_existing(&self, watch_dir: &Path) -> usize {
        let images = self.scanner.scan(watch_dir);
        tracing::info!(
            watch_dir = %watch_dir.display(),
            count = images.len(),
            "Startup scan complete"
        );

        let mut processed = 0;
        for image in &images {
            match self.process_image(image).await {
                Ok(_) => processed += 1,
                Err(e) => {
                    tracing::error!(
                        image = %image.display(),
                        error = %e,
                        "Failed to process image"
                    );
                }
            }
        }

        processed
    }

    /// Consume creation events until the source closes or `shutdown`
    /// resolves. An image already in flight finishes before the loop exits;
    /// no mid-upload cancellation is attempted.
    pub async fn run_events<S, F>(&self, mut source: S, shutdown: F) -> usize
    where
        S: EventSource,
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut processed = 0;

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, stopping event listener");
                    break;
                }
                event = source.next_created() => {
                    let Some(path) = event else {
                        tracing::info!("Event source closed");
                        break;
                    };
                    if !path.is_file() || !is_image_file(&path) {
                        continue;
                    }
                    match self.process_image(&path).await {
                        Ok(_) => processed += 1,
                        Err(e) => {
                            tracing::error!(
                                image = %path.display(),
                                error = %e,
                                "Failed to process image"
                            );
                        }
                    }
                }
            }
        }

        processed
    }
}
