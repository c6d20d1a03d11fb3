use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Credential file not found: {}", .0.display())]
    MissingCredential(PathBuf),

    #[error("Malformed credential file: {0}")]
    MalformedCredential(String),

    #[error("Credential file has no refresh token")]
    NoRefreshToken,

    #[error("Token refresh rejected (status {status}): {message}")]
    RefreshRejected { status: u16, message: String },

    #[error("HTTP error during token refresh: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Credential serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AuthError>;
