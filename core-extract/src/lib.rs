//! # Extraction Pipeline Module
//!
//! Orchestrates resumable extraction of a remote folder tree to local disk.
//!
//! ## Overview
//!
//! This module manages the lifecycle of one extraction, including:
//! - Walking the remote tree via `RemoteSource` into sanitized relative paths
//! - Planning transfer tasks and persisting them in a JSON ledger
//! - Downloading files (and exporting provider-native documents as PDF)
//!   with bounded retries
//! - Verifying local completeness against the plan
//! - Packaging verified trees into timestamped zip archives
//! - Reporting every attempted transfer in a CSV backlog
//!
//! ## Components
//!
//! - **Name Sanitizer** (`sanitize`): Filesystem-safe names with digest-based shortening
//! - **Tree Walker** (`walker`): Breadth-first remote traversal with pagination
//! - **Task Ledger** (`ledger`): Durable JSON task state, the resume anchor
//! - **Transfer Engine** (`transfer`): Per-task download/export with fixed-delay retries
//! - **Verifier** (`verify`): Expected-versus-actual set difference over local files
//! - **Backup Packager** (`backup`): Zip snapshot of a verified downloads tree
//! - **Backlog Reporter** (`backlog`): Spreadsheet-friendly CSV of attempted transfers
//! - **MIME Census** (`census`): Per-type counts for pre-migration reconnaissance
//! - **Pipeline** (`pipeline`): Sequential orchestration of all of the above

pub mod backlog;
pub mod backup;
pub mod census;
pub mod error;
pub mod ledger;
pub mod model;
pub mod pipeline;
pub mod sanitize;
pub mod transfer;
pub mod verify;
pub mod walker;

pub use error::{ExtractError, Result};
pub use model::{
    is_native_document, BacklogRecord, RemoteEntry, Task, TaskStatus, TransferOutcome,
    TransferResult,
};
pub use census::MimeCensus;
pub use ledger::TaskLedger;
pub use pipeline::{
    default_ignored_mime_types, ExtractConfig, ExtractOutcome, ExtractPipeline,
};
pub use sanitize::sanitize_name;
pub use transfer::{RetryPolicy, TransferEngine};
pub use verify::VerifyReport;
pub use walker::{FailedFolder, WalkErrorPolicy, WalkMode, WalkOptions, WalkReport};
