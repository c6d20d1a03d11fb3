//! Error types for the Google Drive provider

use core_remote::error::RemoteError;
use thiserror::Error;

/// Google Drive provider errors
#[derive(Error, Debug)]
pub enum DriveError {
    /// Authentication failed or token could not be produced
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request returned an error
    #[error("Google Drive API error (status {status_code}): {message}")]
    ApiError { status_code: u16, message: String },

    /// File not found
    #[error("File not found: {file_id}")]
    FileNotFound { file_id: String },

    /// Failed to parse API response
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// IO error writing downloaded content
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Google Drive operations
pub type Result<T> = std::result::Result<T, DriveError>;

impl From<DriveError> for RemoteError {
    fn from(error: DriveError) -> Self {
        match error {
            DriveError::AuthenticationFailed(msg) => RemoteError::Auth(msg),
            DriveError::ApiError {
                status_code,
                message,
            } => RemoteError::Api {
                status: status_code,
                message,
            },
            DriveError::FileNotFound { file_id } => RemoteError::Api {
                status: 404,
                message: format!("File not found: {}", file_id),
            },
            DriveError::ParseError(msg) => RemoteError::Parse(msg),
            DriveError::NetworkError(msg) => RemoteError::Network(msg),
            DriveError::Io(e) => RemoteError::Io(e),
        }
    }
}
