//! # Extraction Records
//!
//! Task and record types shared across the extraction pipeline.
//!
//! ## Overview
//!
//! The walker produces [`RemoteEntry`] values; every non-folder entry
//! becomes exactly one [`Task`] in the ledger. Tasks persist across runs,
//! so their shape is the ledger's on-disk schema. [`BacklogRecord`] is the
//! per-attempt reporting row written to the CSV backlog.
//!
//! ## Status Lifecycle
//!
//! ```text
//! Pending → Completed
//!     ↓
//!   Failed           (left in place; a fresh plan is the retry path)
//!
//! Ignored            (assigned at planning, never leaves)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

use crate::error::{ExtractError, Result};

// ============================================================================
// Status Types
// ============================================================================

/// The current status of an extraction task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Discovered but not yet transferred
    Pending,
    /// Present locally, nothing left to do
    Completed,
    /// All transfer attempts failed; later passes leave it alone
    Failed,
    /// MIME type is on the ignore list; never transferred
    Ignored,
}

impl TaskStatus {
    /// Check if this status means no later pass over the same ledger
    /// will attempt further work
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Ignored | TaskStatus::Failed
        )
    }

    /// Get the string representation for ledger storage
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
            TaskStatus::Ignored => "ignored",
        }
    }
}

impl FromStr for TaskStatus {
    type Err = ExtractError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "completed" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            "ignored" => Ok(TaskStatus::Ignored),
            _ => Err(ExtractError::InvalidStatus(s.to_string())),
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Remote Entries
// ============================================================================

/// One item discovered during a walk of the remote tree
///
/// `relative_path` is built from sanitized components joined with `/`,
/// never from raw provider names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    /// Provider-assigned stable identifier
    pub id: String,
    /// Name exactly as the provider reports it
    pub original_name: String,
    /// Sanitized name, safe for local filesystems
    pub safe_name: String,
    /// Provider MIME type
    pub mime_type: String,
    /// Sanitized path relative to the walk root, forward-slash separated
    pub relative_path: String,
    /// Whether this entry is a folder
    pub is_folder: bool,
    /// Content checksum when the provider reports one
    pub md5_checksum: Option<String>,
}

/// MIME prefix identifying documents that only exist in the provider's
/// native format and must be exported rather than downloaded
pub const NATIVE_DOC_PREFIX: &str = "application/vnd.google-apps";

/// Check whether a MIME type is a provider-native document
///
/// Folders and ignorable types also carry this prefix, but they are
/// filtered out before any transfer decision reads this.
pub fn is_native_document(mime_type: &str) -> bool {
    mime_type.starts_with(NATIVE_DOC_PREFIX)
}

// ============================================================================
// Tasks
// ============================================================================

/// One unit of transfer work, persisted in the ledger across runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Provider-assigned identifier used for the actual fetch
    pub drive_id: String,
    /// Name exactly as the provider reports it
    pub original_name: String,
    /// Sanitized name used on disk
    pub sanitized_name: String,
    /// Provider MIME type, drives the download-vs-export decision
    pub mime_type: String,
    /// Sanitized path relative to the downloads root, forward-slash separated
    pub relative_path: String,
    /// Current lifecycle status
    pub status: TaskStatus,
    /// Transfer attempts consumed by the most recent try
    #[serde(default)]
    pub attempts: u32,
    /// Final error of the most recent failed try
    #[serde(default)]
    pub error_message: Option<String>,
    /// Provider-reported content checksum
    #[serde(default)]
    pub md5_checksum: Option<String>,
}

impl Task {
    /// Derive a task from a walked file entry
    ///
    /// Entries whose MIME type is in the ignore set start (and stay)
    /// `Ignored`; everything else starts `Pending`.
    pub fn from_entry(entry: RemoteEntry, ignored_mime_types: &BTreeSet<String>) -> Self {
        let status = if ignored_mime_types.contains(&entry.mime_type) {
            TaskStatus::Ignored
        } else {
            TaskStatus::Pending
        };

        Self {
            drive_id: entry.id,
            original_name: entry.original_name,
            sanitized_name: entry.safe_name,
            mime_type: entry.mime_type,
            relative_path: entry.relative_path,
            status,
            attempts: 0,
            error_message: None,
            md5_checksum: entry.md5_checksum,
        }
    }

    /// The relative path the transfer will actually produce locally
    ///
    /// Provider-native documents are exported as PDF, so their final
    /// component swaps its extension for `.pdf`. The transfer engine, the
    /// resume check, and the verifier all use this same computation.
    pub fn expected_local_rel_path(&self) -> String {
        if !is_native_document(&self.mime_type) {
            return self.relative_path.clone();
        }

        let (dir, file) = match self.relative_path.rsplit_once('/') {
            Some((dir, file)) => (Some(dir), file),
            None => (None, self.relative_path.as_str()),
        };

        let root = match file.rsplit_once('.') {
            Some((root, _)) if !root.is_empty() => root,
            _ => file,
        };

        match dir {
            Some(dir) => format!("{}/{}.pdf", dir, root),
            None => format!("{}.pdf", root),
        }
    }

    /// Whether sanitization changed the provider's name
    pub fn was_renamed(&self) -> bool {
        self.original_name != self.sanitized_name
    }
}

// ============================================================================
// Transfer Results
// ============================================================================

/// Outcome of one transfer attempt cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferOutcome {
    /// The file was written locally
    Success,
    /// Every attempt failed
    Failure,
}

impl TransferOutcome {
    /// Get the string representation for reporting
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferOutcome::Success => "success",
            TransferOutcome::Failure => "failure",
        }
    }
}

impl std::fmt::Display for TransferOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of transferring one task, including retry accounting
#[derive(Debug, Clone)]
pub struct TransferResult {
    /// Overall outcome after all attempts
    pub outcome: TransferOutcome,
    /// Attempts actually used (1-based)
    pub attempts: u32,
    /// Bytes written on success
    pub bytes_written: u64,
    /// Final attempt's error on failure
    pub error_message: Option<String>,
}

// ============================================================================
// Backlog Records
// ============================================================================

/// One row of the per-run CSV backlog
///
/// Field declaration order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BacklogRecord {
    /// When the attempt finished (UTC, RFC 3339)
    pub timestamp: DateTime<Utc>,
    /// Uppercase transfer outcome
    pub status: String,
    /// Provider-assigned identifier
    pub drive_id: String,
    /// Name exactly as the provider reports it
    pub original_name: String,
    /// Sanitized name used on disk
    pub sanitized_name: String,
    /// Whether sanitization changed the name
    pub was_renamed: bool,
    /// Sanitized path relative to the downloads root
    pub relative_path: String,
    /// Attempts used
    pub attempts: u32,
    /// Final error message, empty on success
    pub error_message: Option<String>,
    /// Provider-reported content checksum
    pub md5_checksum: Option<String>,
}

impl BacklogRecord {
    /// Build the report row for one attempted task
    pub fn from_attempt(task: &Task, result: &TransferResult, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            status: result.outcome.as_str().to_ascii_uppercase(),
            drive_id: task.drive_id.clone(),
            original_name: task.original_name.clone(),
            sanitized_name: task.sanitized_name.clone(),
            was_renamed: task.was_renamed(),
            relative_path: task.relative_path.clone(),
            attempts: result.attempts,
            error_message: result.error_message.clone(),
            md5_checksum: task.md5_checksum.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, mime: &str) -> RemoteEntry {
        RemoteEntry {
            id: "id1".to_string(),
            original_name: name.to_string(),
            safe_name: name.to_string(),
            mime_type: mime.to_string(),
            relative_path: name.to_string(),
            is_folder: false,
            md5_checksum: None,
        }
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            TaskStatus::Pending,
            TaskStatus::Completed,
            TaskStatus::Failed,
            TaskStatus::Ignored,
        ] {
            let parsed: TaskStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
    }

    #[test]
    fn test_status_serde_uses_lowercase() {
        let json = serde_json::to_string(&TaskStatus::Completed).unwrap();
        assert_eq!(json, "\"completed\"");

        let parsed: TaskStatus = serde_json::from_str("\"ignored\"").unwrap();
        assert_eq!(parsed, TaskStatus::Ignored);
    }

    #[test]
    fn test_status_from_str_invalid() {
        let result: Result<TaskStatus> = "downloading".parse();
        assert!(matches!(result, Err(ExtractError::InvalidStatus(_))));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Ignored.is_terminal());
    }

    #[test]
    fn test_task_from_entry_marks_ignored_mime() {
        let ignored: BTreeSet<String> =
            BTreeSet::from(["application/vnd.google-apps.shortcut".to_string()]);

        let shortcut = Task::from_entry(
            entry("link", "application/vnd.google-apps.shortcut"),
            &ignored,
        );
        assert_eq!(shortcut.status, TaskStatus::Ignored);

        let pdf = Task::from_entry(entry("scan.pdf", "application/pdf"), &ignored);
        assert_eq!(pdf.status, TaskStatus::Pending);
        assert_eq!(pdf.attempts, 0);
    }

    #[test]
    fn test_expected_path_unchanged_for_plain_files() {
        let mut task = Task::from_entry(entry("scan.pdf", "application/pdf"), &BTreeSet::new());
        task.relative_path = "contracts/2023/scan.pdf".to_string();

        assert_eq!(task.expected_local_rel_path(), "contracts/2023/scan.pdf");
    }

    #[test]
    fn test_expected_path_swaps_extension_for_native_docs() {
        let mut task = Task::from_entry(
            entry("Report.docx", "application/vnd.google-apps.document"),
            &BTreeSet::new(),
        );
        task.relative_path = "reports/Report.docx".to_string();

        assert_eq!(task.expected_local_rel_path(), "reports/Report.pdf");
    }

    #[test]
    fn test_expected_path_native_doc_without_extension() {
        let task = Task::from_entry(
            entry("Notes", "application/vnd.google-apps.document"),
            &BTreeSet::new(),
        );

        assert_eq!(task.expected_local_rel_path(), "Notes.pdf");
    }

    #[test]
    fn test_expected_path_native_doc_multi_dot_keeps_inner_dots() {
        let task = Task::from_entry(
            entry("v1.2.final", "application/vnd.google-apps.spreadsheet"),
            &BTreeSet::new(),
        );

        assert_eq!(task.expected_local_rel_path(), "v1.2.pdf");
    }

    #[test]
    fn test_expected_path_native_doc_leading_dot_name() {
        let task = Task::from_entry(
            entry(".config", "application/vnd.google-apps.document"),
            &BTreeSet::new(),
        );

        assert_eq!(task.expected_local_rel_path(), ".config.pdf");
    }

    #[test]
    fn test_backlog_record_sets_rename_flag() {
        let mut task = Task::from_entry(entry("a:b.txt", "text/plain"), &BTreeSet::new());
        task.sanitized_name = "a-b.txt".to_string();

        let result = TransferResult {
            outcome: TransferOutcome::Success,
            attempts: 1,
            bytes_written: 10,
            error_message: None,
        };
        let record = BacklogRecord::from_attempt(&task, &result, Utc::now());

        assert!(record.was_renamed);
        assert_eq!(record.status, "SUCCESS");
        assert!(record.error_message.is_none());
    }

    #[test]
    fn test_backlog_record_failure_carries_error() {
        let task = Task::from_entry(entry("scan.pdf", "application/pdf"), &BTreeSet::new());

        let result = TransferResult {
            outcome: TransferOutcome::Failure,
            attempts: 3,
            bytes_written: 0,
            error_message: Some("network unreachable".to_string()),
        };
        let record = BacklogRecord::from_attempt(&task, &result, Utc::now());

        assert_eq!(record.status, "FAILURE");
        assert_eq!(record.attempts, 3);
        assert_eq!(record.error_message.as_deref(), Some("network unreachable"));
    }

    #[test]
    fn test_task_ledger_round_trip() {
        let task = Task::from_entry(entry("scan.pdf", "application/pdf"), &BTreeSet::new());
        let json = serde_json::to_string(&task).unwrap();
        let parsed: Task = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, task);
    }
}
