//! # Completeness Verification
//!
//! Compares what the ledger says should exist locally against what a
//! filesystem scan actually finds.
//!
//! ## Overview
//!
//! Verification is a pure set difference over relative paths. Ignored and
//! failed tasks are excluded from the expected set, so a run with known
//! failures still reports precisely which files are unaccounted for.
//! Extra local files are never an error; only absence is.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{ExtractError, Result};
use crate::model::{Task, TaskStatus};

/// Outcome of comparing expected against actual local files
#[derive(Debug, Clone, Default)]
pub struct VerifyReport {
    /// Expected paths with no local counterpart, sorted
    pub missing: Vec<String>,
    /// Size of the expected set
    pub expected_count: usize,
    /// Files found by the local scan
    pub actual_count: usize,
}

impl VerifyReport {
    /// Whether every expected file is present
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// The set of relative paths a fully successful run would leave on disk
///
/// Ignored tasks were never meant to exist locally and failed tasks are
/// known absences, so neither contributes to the expected set.
pub fn expected_paths(tasks: &[Task]) -> BTreeSet<String> {
    tasks
        .iter()
        .filter(|t| !matches!(t.status, TaskStatus::Ignored | TaskStatus::Failed))
        .map(Task::expected_local_rel_path)
        .collect()
}

/// Scan a local downloads tree into a set of forward-slash relative paths
///
/// A missing root yields an empty set rather than an error, so verifying
/// a run that transferred nothing still works.
///
/// # Errors
///
/// Returns [`ExtractError::Scan`] when a directory entry cannot be read.
pub fn scan_local(root: &Path) -> Result<BTreeSet<String>> {
    let mut found = BTreeSet::new();
    if !root.exists() {
        debug!(root = %root.display(), "Downloads root absent, scan is empty");
        return Ok(found);
    }

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| ExtractError::Scan(e.to_string()))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| ExtractError::Scan(e.to_string()))?;
        let joined = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        found.insert(joined);
    }

    debug!(root = %root.display(), count = found.len(), "Scanned local tree");
    Ok(found)
}

/// Compare the expected set against the scanned set
pub fn verify(expected: &BTreeSet<String>, actual: &BTreeSet<String>) -> VerifyReport {
    let missing: Vec<String> = expected.difference(actual).cloned().collect();

    VerifyReport {
        missing,
        expected_count: expected.len(),
        actual_count: actual.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeSet as Set;

    use crate::model::RemoteEntry;

    fn task(rel: &str, mime: &str, status: TaskStatus) -> Task {
        let mut task = Task::from_entry(
            RemoteEntry {
                id: format!("id-{}", rel),
                original_name: rel.to_string(),
                safe_name: rel.to_string(),
                mime_type: mime.to_string(),
                relative_path: rel.to_string(),
                is_folder: false,
                md5_checksum: None,
            },
            &Set::new(),
        );
        task.status = status;
        task
    }

    #[test]
    fn test_expected_paths_skip_ignored_and_failed() {
        let tasks = vec![
            task("keep.pdf", "application/pdf", TaskStatus::Completed),
            task("also.pdf", "application/pdf", TaskStatus::Pending),
            task("gone.pdf", "application/pdf", TaskStatus::Failed),
            task("skip.lnk", "application/pdf", TaskStatus::Ignored),
        ];

        let expected = expected_paths(&tasks);

        assert_eq!(
            expected,
            Set::from(["keep.pdf".to_string(), "also.pdf".to_string()])
        );
    }

    #[test]
    fn test_expected_paths_use_pdf_name_for_native_docs() {
        let tasks = vec![task(
            "Report.docx",
            "application/vnd.google-apps.document",
            TaskStatus::Completed,
        )];

        let expected = expected_paths(&tasks);

        assert_eq!(expected, Set::from(["Report.pdf".to_string()]));
    }

    #[test]
    fn test_verify_reports_sorted_missing_paths() {
        let expected = Set::from(["a/b.txt".to_string(), "c.txt".to_string()]);
        let actual = Set::from(["a/b.txt".to_string()]);

        let report = verify(&expected, &actual);

        assert_eq!(report.missing, vec!["c.txt".to_string()]);
        assert_eq!(report.expected_count, 2);
        assert_eq!(report.actual_count, 1);
        assert!(!report.is_complete());
    }

    #[test]
    fn test_extra_local_files_do_not_fail_verification() {
        let expected = Set::from(["a.txt".to_string()]);
        let actual = Set::from(["a.txt".to_string(), "stray.tmp".to_string()]);

        let report = verify(&expected, &actual);

        assert!(report.is_complete());
    }

    #[test]
    fn test_scan_local_lists_nested_files_with_forward_slashes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a/b")).unwrap();
        std::fs::write(dir.path().join("a/b/deep.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("top.txt"), b"y").unwrap();

        let found = scan_local(dir.path()).unwrap();

        assert_eq!(
            found,
            Set::from(["a/b/deep.txt".to_string(), "top.txt".to_string()])
        );
    }

    #[test]
    fn test_scan_local_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let found = scan_local(&dir.path().join("never-created")).unwrap();

        assert!(found.is_empty());
    }

    #[test]
    fn test_scan_local_skips_directories_themselves() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("empty-folder")).unwrap();

        let found = scan_local(dir.path()).unwrap();

        assert!(found.is_empty());
    }
}
