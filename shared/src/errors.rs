//! Shared error types for the story generation client

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("invalid story request: {message}")]
    InvalidRequest { message: String },

    #[error("invalid image identifier: {input}")]
    InvalidImageId { input: String },
}

pub type SharedResult<T> = Result<T, SharedError>;

impl SharedError {
    /// Build an `InvalidRequest` error from any displayable message
    pub fn invalid_request(message: impl Into<String>) -> Self {
        SharedError::InvalidRequest {
            message: message.into(),
        }
    }
}
