//! # Remote Tree Walker
//!
//! Breadth-first traversal of a remote folder tree into a flat list of
//! [`RemoteEntry`] values with sanitized relative paths.
//!
//! ## Overview
//!
//! The walker visits folders in discovery order using an explicit queue,
//! so arbitrarily deep trees never grow the call stack. Each folder's
//! listing is paginated to completion before any of its children are
//! recorded; a failure mid-listing therefore fails the whole folder and
//! never yields a partial set of siblings.
//!
//! ## Error Policy
//!
//! A folder that cannot be listed either aborts the walk
//! ([`WalkErrorPolicy::Strict`]) or is recorded in the report and skipped
//! along with its entire subtree ([`WalkErrorPolicy::Lenient`]).

use std::collections::VecDeque;

use tracing::{debug, info, warn};

use core_remote::source::{RemoteChild, RemoteSource};

use crate::error::{ExtractError, Result};
use crate::model::RemoteEntry;
use crate::sanitize::sanitize_name;

// ============================================================================
// Options
// ============================================================================

/// Which entries a walk reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkMode {
    /// Report files only; folders are traversed but not recorded
    #[default]
    FilesOnly,
    /// Report files and folders alike
    FullInventory,
}

/// What an unlistable folder does to the walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkErrorPolicy {
    /// Record the failure, skip the subtree, keep walking
    #[default]
    Lenient,
    /// Abort the walk on the first failure
    Strict,
}

/// Walk configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkOptions {
    /// Which entries to report
    pub mode: WalkMode,
    /// How listing failures are handled
    pub error_policy: WalkErrorPolicy,
}

// ============================================================================
// Report
// ============================================================================

/// A folder whose listing failed during a lenient walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFolder {
    /// Provider identifier of the folder
    pub folder_id: String,
    /// Sanitized path of the folder, empty for the walk root
    pub path: String,
    /// Why the listing failed
    pub error: String,
}

/// Everything one walk discovered
#[derive(Debug, Clone, Default)]
pub struct WalkReport {
    /// Discovered entries in visit order
    pub entries: Vec<RemoteEntry>,
    /// Folders skipped because their listing failed
    pub failed_folders: Vec<FailedFolder>,
}

// ============================================================================
// Walk
// ============================================================================

/// Walk a remote folder tree breadth-first
///
/// Child paths are built from sanitized name components joined with `/`,
/// relative to the walk root. Sibling order within a folder follows the
/// provider's listing order.
///
/// # Errors
///
/// Returns [`ExtractError::WalkAborted`] when a folder cannot be listed
/// under [`WalkErrorPolicy::Strict`]. Lenient walks record the failure in
/// the report instead.
pub async fn walk(
    source: &dyn RemoteSource,
    root_folder_id: &str,
    options: &WalkOptions,
) -> Result<WalkReport> {
    let mut report = WalkReport::default();
    let mut queue: VecDeque<(String, String)> = VecDeque::new();
    queue.push_back((root_folder_id.to_string(), String::new()));

    while let Some((folder_id, folder_path)) = queue.pop_front() {
        let children = match list_folder(source, &folder_id).await {
            Ok(children) => children,
            Err(err) => match options.error_policy {
                WalkErrorPolicy::Strict => {
                    return Err(ExtractError::WalkAborted {
                        folder_id,
                        path: folder_path,
                        message: err.to_string(),
                    });
                }
                WalkErrorPolicy::Lenient => {
                    warn!(
                        folder_id = %folder_id,
                        path = %folder_path,
                        error = %err,
                        "Skipping unlistable folder and its subtree"
                    );
                    report.failed_folders.push(FailedFolder {
                        folder_id,
                        path: folder_path,
                        error: err.to_string(),
                    });
                    continue;
                }
            },
        };

        debug!(
            folder_id = %folder_id,
            path = %folder_path,
            count = children.len(),
            "Walked folder"
        );

        for child in children {
            let safe_name = sanitize_name(&child.name);
            let relative_path = if folder_path.is_empty() {
                safe_name.clone()
            } else {
                format!("{}/{}", folder_path, safe_name)
            };

            if child.is_folder {
                queue.push_back((child.id.clone(), relative_path.clone()));
                if options.mode == WalkMode::FilesOnly {
                    continue;
                }
            }

            report.entries.push(RemoteEntry {
                id: child.id,
                original_name: child.name,
                safe_name,
                mime_type: child.mime_type,
                relative_path,
                is_folder: child.is_folder,
                md5_checksum: child.md5_checksum,
            });
        }
    }

    info!(
        entries = report.entries.len(),
        failed_folders = report.failed_folders.len(),
        "Walk complete"
    );

    Ok(report)
}

/// List every direct child of one folder, following pagination to the end
async fn list_folder(
    source: &dyn RemoteSource,
    folder_id: &str,
) -> core_remote::error::Result<Vec<RemoteChild>> {
    let mut children = Vec::new();
    let mut page_token: Option<String> = None;

    loop {
        let page = source.list_children(folder_id, page_token).await?;
        children.extend(page.children);

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(children)
}
