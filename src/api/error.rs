//! Error types for the Pulsar API client.

use thiserror::Error;

/// Errors that can occur when calling the Pulsar API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The server answered with a non-success status and no RPC error body.
    #[error("API returned status {0}")]
    Status(u16),

    /// The server reported an RPC error.
    #[error("{code}: {message}")]
    Rpc { code: String, message: String },

    /// Failed to decode the response body.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,

    /// Response uses a feature this client does not speak.
    #[error("Unsupported response: {0}")]
    Unsupported(String),
}

impl ApiError {
    /// Whether the error means the server could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Connection(_) | ApiError::Timeout)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Connection(err.to_string())
        } else if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
