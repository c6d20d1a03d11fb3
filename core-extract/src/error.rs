//! # Extraction Errors
//!
//! Error types for the extraction pipeline.

use thiserror::Error;

/// Errors raised while planning, transferring, verifying or packaging
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A remote operation failed outside any retry loop
    #[error("Remote error: {0}")]
    Remote(#[from] core_remote::error::RemoteError),

    /// A strict walk hit an unlistable folder
    #[error("Walk aborted at folder {folder_id} ({path}): {message}")]
    WalkAborted {
        folder_id: String,
        path: String,
        message: String,
    },

    /// The task ledger could not be persisted
    #[error("Ledger write failed for {path}: {message}")]
    LedgerWrite { path: String, message: String },

    /// The CSV backlog could not be written
    #[error("Backlog write failed for {path}: {message}")]
    BacklogWrite { path: String, message: String },

    /// Archive creation failed
    #[error("Backup packaging failed: {0}")]
    Backup(String),

    /// The local downloads tree could not be scanned
    #[error("Local scan failed: {0}")]
    Scan(String),

    /// A status string in the ledger is not a known task status
    #[error("Invalid task status: {0}")]
    InvalidStatus(String),

    /// A blocking background task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Background(String),

    /// An IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for extraction operations
pub type Result<T> = std::result::Result<T, ExtractError>;
