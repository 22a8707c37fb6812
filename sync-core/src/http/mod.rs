//! HTTP client utilities shared by the external-service clients.

pub mod retry;

pub use retry::{RetryConfig, retry_http_call};

use crate::error::AppError;
use std::time::Duration;

/// Default bound on any single request to an external service.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build a reqwest client with a bounded per-request timeout.
pub fn build_client(timeout: Duration) -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(AppError::Transport)
}
