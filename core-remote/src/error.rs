//! Error Types
//!
//! Shared error type for all seam traits. Provider crates convert their
//! internal errors into [`RemoteError`] so the pipeline handles one shape.

use thiserror::Error;

/// Errors surfaced across the remote-source seam
#[derive(Error, Debug)]
pub enum RemoteError {
    /// The provider API rejected the request
    #[error("Remote API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// The request never completed
    #[error("Network error: {0}")]
    Network(String),

    /// The provider's response could not be decoded
    #[error("Failed to parse remote response: {0}")]
    Parse(String),

    /// No valid credential could be produced
    #[error("Authentication error: {0}")]
    Auth(String),

    /// A local filesystem operation failed mid-transfer
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for seam operations
pub type Result<T> = std::result::Result<T, RemoteError>;
