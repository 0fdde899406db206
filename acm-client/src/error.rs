//! Error types for the ACM client

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur when talking to the ACM service
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response (connect, TLS, timeout)
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Service answered with a non-success status other than 404
    #[error("API error (status {status}): {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Response body, or a placeholder when it could not be read
        message: String,
    },

    /// Response body did not match the expected shape
    #[error("Failed to parse response: {0}")]
    ParseError(String),

    /// Resource does not exist, or does not exist yet
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Caller passed something the client refuses to send
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ClientError {
    /// Create an API error from status code and message
    pub fn api_error(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError {
            status,
            message: message.into(),
        }
    }

    /// Check if this error is a "not found" error
    ///
    /// For results and output streams this usually means "not written yet"
    /// rather than "never will be"; callers decide which.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_)) || matches!(self, Self::ApiError { status: 404, .. })
    }
}
