//! Error types for client operations

use thiserror::Error;

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors that can occur during client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Invalid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Server returned an error response
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Failed to decode the response body as JSON
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Expected field absent from a decoded response
    #[error("Missing field in response: {0}")]
    MissingField(String),

    /// Request data could not be form-encoded
    #[error("Failed to encode request data: {0}")]
    Encode(String),
}

impl ClientError {
    /// Create a server error from status code and message
    pub fn server_error(status: u16, message: impl Into<String>) -> Self {
        Self::Server {
            status,
            message: message.into(),
        }
    }
}
