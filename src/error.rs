//! Error types for the detection pipeline
//!
//! Internal browser plumbing works in `anyhow::Result`; module boundaries
//! convert into `AuthDetectError` so the service layer can classify failures.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for detection operations
pub type Result<T> = std::result::Result<T, AuthDetectError>;

#[derive(Debug, Error)]
pub enum AuthDetectError {
    /// Caller supplied something that is not an absolute http(s) URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Browser process could not be started
    #[error("Failed to launch browser: {0}")]
    BrowserLaunch(String),

    /// CDP command or page operation failed
    #[error("Browser operation failed: {0}")]
    Browser(String),

    /// Navigation was rejected by the browser
    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    /// A bounded step ran out of time
    #[error("{operation} timed out after {}ms", .after.as_millis())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Transport or HTTP-level failure talking to the model
    #[error("AI request failed: {0}")]
    AiRequest(String),

    /// Model answered but the answer did not satisfy the response contract
    #[error("AI response rejected: {0}")]
    AiResponse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Anything else, including panics caught at the pipeline boundary
    #[error("{0}")]
    Internal(String),
}

impl From<anyhow::Error> for AuthDetectError {
    fn from(error: anyhow::Error) -> Self {
        AuthDetectError::Browser(format!("{error:#}"))
    }
}

impl AuthDetectError {
    /// Check if the failure is worth retrying on a later request
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AuthDetectError::Timeout { .. }
                | AuthDetectError::AiRequest(_)
                | AuthDetectError::BrowserLaunch(_)
                | AuthDetectError::Browser(_)
        )
    }

    /// Errors caused by the request itself rather than the service
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, AuthDetectError::InvalidUrl(_))
    }
}
