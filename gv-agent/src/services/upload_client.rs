//! Inference endpoint upload client
//!
//! Sends one image per request as a multipart POST and parses the JSON
//! response. A single reqwest client is built per run and reused across
//! uploads; the retry policy wraps the whole send.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::utils::retry::{retry_async, RetryPolicy};

const USER_AGENT: &str = "gv-agent/0.1.0";
const MULTIPART_FIELD: &str = "file";
const OCTET_STREAM: &str = "application/octet-stream";

/// Upload client errors
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Cannot read image {0}: {1}")]
    FileNotReadable(PathBuf, String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Endpoint returned status {0}: {1}")]
    Status(u16, String),

    #[error("Malformed response body: {0}")]
    MalformedResponse(String),
}

impl UploadError {
    /// Whether a failed attempt is worth resending. An unreadable image
    /// will not become readable by repeating the request.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, UploadError::FileNotReadable(_, _))
    }
}

/// Inference endpoint client
pub struct UploadClient {
    http_client: reqwest::Client,
    api_url: String,
    retry_policy: RetryPolicy,
}

impl UploadClient {
    pub fn new(api_url: String, request_timeout: Duration) -> Result<Self, UploadError> {
        Self::with_retry_policy(api_url, request_timeout, RetryPolicy::default())
    }

    pub fn with_retry_policy(
        api_url: String,
        request_timeout: Duration,
        retry_policy: RetryPolicy,
    ) -> Result<Self, UploadError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(request_timeout)
            .build()
            .map_err(|e| UploadError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            api_url,
            retry_policy,
        })
    }

    /// Upload one image and parse the prediction response, retrying
    /// transient failures under the configured policy.
    ///
    /// Attempts are not idempotent at the remote side; duplicate processing
    /// caused by a retry is accepted.
    pub async fn predict(&self, image_path: &Path) -> Result<Value, UploadError> {
        retry_async(
            &self.retry_policy,
            "image upload",
            UploadError::is_retryable,
            || self.send(image_path),
        )
        .await
    }

    /// Single upload attempt: multipart POST carrying the image bytes under
    /// the `file` field, named after the image's base name.
    pub async fn send(&self, image_path: &Path) -> Result<Value, UploadError> {
        let file_name = image_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());

        let bytes = tokio::fs::read(image_path)
            .await
            .map_err(|e| UploadError::FileNotReadable(image_path.to_path_buf(), e.to_string()))?;

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(OCTET_STREAM)
            .map_err(|e| UploadError::Network(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part(MULTIPART_FIELD, part);

        tracing::debug!(
            image = %image_path.display(),
            url = %self.api_url,
            "Uploading image"
        );

        let response = self
            .http_client
            .post(&self.api_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| UploadError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(UploadError::Status(status.as_u16(), error_text));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| UploadError::MalformedResponse(e.to_string()))
    }
}
