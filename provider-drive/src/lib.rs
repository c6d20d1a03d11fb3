//! # Google Drive Provider
//!
//! Implements the `RemoteSource` trait for Google Drive API v3.
//!
//! ## Overview
//!
//! This module provides:
//! - Folder listing scoped to a parent, excluding trashed items
//! - Token-based pagination at the API's maximum page size
//! - Streaming media downloads written straight to disk
//! - PDF export for Workspace-native documents
//! - Bearer authentication through an injected credential provider

pub mod client;
pub mod error;
pub mod types;

pub use client::DriveClient;
pub use error::{DriveError, Result};
