//! Retry with exponential backoff
//!
//! Uploads to the inference endpoint are retried under a bounded exponential
//! backoff. The policy is a plain value applied around the single operation,
//! so timing behavior can be tested without a live endpoint.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Backoff policy applied around a retried operation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    /// 3 attempts with inter-attempt delays of 1s, 2s, ... capped at 10s.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Delay to sleep after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1) as i32;
        let delay = self.base_delay.mul_f64(self.multiplier.powi(exponent));
        delay.min(self.max_delay)
    }
}

/// Run `operation` under `policy`, retrying failures accepted by
/// `is_retryable`.
///
/// Non-retryable errors and the final attempt's error are returned to the
/// caller unchanged. Retries are logged at WARN with the operation name.
pub async fn retry_async<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    operation_name: &str,
    is_retryable: P,
    mut operation: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
{
    let mut attempt = 0u32;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        "Operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(err) => {
                if !is_retryable(&err) || attempt >= policy.max_attempts {
                    return Err(err);
                }

                let backoff = policy.delay_for(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms = backoff.as_millis() as u64,
                    error = %err,
                    "Operation failed, will retry after backoff"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}
