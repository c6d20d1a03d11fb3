//! # Credential Management
//!
//! Credential collaborator for the extraction pipeline.
//!
//! ## Overview
//!
//! The pipeline never performs an interactive sign-in. It expects a
//! previously provisioned credential file (the authorized-user shape most
//! OAuth tooling writes) and asks this crate for a valid bearer token
//! through the [`CredentialProvider`](provider::CredentialProvider) seam.
//! The file-backed implementation refreshes the token over HTTP when it is
//! expired or about to expire, and persists the refreshed credential back
//! to disk so later runs start warm.
//!
//! ## Features
//!
//! - `get_or_refresh` seam the pipeline injects wherever a token is needed
//! - Transparent refresh with a freshness buffer before actual expiry
//! - Credential file rewrite after every successful refresh
//! - Token secrets redacted from all `Debug` output

pub mod error;
pub mod provider;
pub mod types;

pub use error::{AuthError, Result};
pub use provider::{CredentialProvider, FileCredentialStore};
pub use types::{AccessToken, StoredCredential};
