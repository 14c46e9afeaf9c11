//! Provider error types.

use thiserror::Error;

/// Errors that can occur when talking to a diagnostic backend.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// A network error occurred.
    #[error("network error: {0}")]
    NetworkError(String),

    /// The backend returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    ApiError { status: u16, message: String },

    /// The backend answered with a body we could not use.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    pub(crate) fn from_reqwest(e: reqwest::Error, timeout_secs: u64, base_url: &str) -> Self {
        if e.is_timeout() {
            ProviderError::Timeout(timeout_secs)
        } else if e.is_connect() {
            ProviderError::NetworkError(format!("backend not reachable at {base_url}"))
        } else {
            ProviderError::NetworkError(e.to_string())
        }
    }
}
