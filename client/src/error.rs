//! Client error types

use thiserror::Error;

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error types
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("connection failed: {message}")]
    ConnectError { message: String },

    #[error("stream interrupted: {message}")]
    StreamError { message: String },

    #[error("invalid story request: {message}")]
    RequestError { message: String },

    #[error("configuration error: {message}")]
    ConfigError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl ClientError {
    /// Build a `ConnectError` from any displayable message
    pub fn connect(message: impl Into<String>) -> Self {
        ClientError::ConnectError {
            message: message.into(),
        }
    }

    /// Build a `StreamError` from any displayable message
    pub fn stream(message: impl Into<String>) -> Self {
        ClientError::StreamError {
            message: message.into(),
        }
    }

    /// Build a `RequestError` from any displayable message
    pub fn request(message: impl Into<String>) -> Self {
        ClientError::RequestError {
            message: message.into(),
        }
    }

    /// Build a `ConfigError` from any displayable message
    pub fn config(message: impl Into<String>) -> Self {
        ClientError::ConfigError {
            message: message.into(),
        }
    }
}
