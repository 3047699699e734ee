//! Cross-cutting helpers

pub mod retry;

pub use retry::{retry_async, RetryPolicy};
