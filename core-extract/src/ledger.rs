//! # Task Ledger
//!
//! Durable JSON record of every task's status, the anchor for resumable
//! runs.
//!
//! ## Overview
//!
//! The ledger is a pretty-printed JSON array of tasks, one file per
//! extraction label. A missing or unreadable ledger is never fatal: the
//! planner falls back to a fresh remote walk and writes a new one. Saving
//! is the part that must not fail silently, since a lost save forgets
//! completed work.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{ExtractError, Result};
use crate::model::Task;

/// Reads and writes the per-label task ledger file
#[derive(Debug, Clone)]
pub struct TaskLedger {
    path: PathBuf,
}

impl TaskLedger {
    /// Create a ledger handle for the given file path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Conventional ledger file name for an extraction label
    pub fn default_file_name(label: &str) -> String {
        format!("download_state_{}.json", label)
    }

    /// The file this ledger reads and writes
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted tasks, if a usable ledger exists
    ///
    /// Returns `None` when the file is absent, unreadable or not valid
    /// task JSON. Corruption is logged and treated as absence so a fresh
    /// walk can rebuild the plan.
    pub async fn load(&self) -> Option<Vec<Task>> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No ledger found, starting fresh");
                return None;
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Ledger unreadable, starting fresh"
                );
                return None;
            }
        };

        match serde_json::from_str::<Vec<Task>>(&raw) {
            Ok(tasks) => {
                debug!(path = %self.path.display(), count = tasks.len(), "Loaded ledger");
                Some(tasks)
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %err,
                    "Ledger corrupt, starting fresh"
                );
                None
            }
        }
    }

    /// Persist the full task list, replacing any previous ledger
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::LedgerWrite`] when the parent directory
    /// cannot be created, serialization fails or the write fails.
    pub async fn save(&self, tasks: &[Task]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.write_error(e.to_string()))?;
            }
        }

        let json = serde_json::to_string_pretty(tasks)
            .map_err(|e| self.write_error(e.to_string()))?;
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| self.write_error(e.to_string()))?;

        debug!(path = %self.path.display(), count = tasks.len(), "Saved ledger");
        Ok(())
    }

    fn write_error(&self, message: String) -> ExtractError {
        ExtractError::LedgerWrite {
            path: self.path.display().to_string(),
            message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeSet;

    use crate::model::{RemoteEntry, TaskStatus};

    fn sample_task(name: &str) -> Task {
        Task::from_entry(
            RemoteEntry {
                id: format!("id-{}", name),
                original_name: name.to_string(),
                safe_name: name.to_string(),
                mime_type: "application/pdf".to_string(),
                relative_path: name.to_string(),
                is_folder: false,
                md5_checksum: Some("abc123".to_string()),
            },
            &BTreeSet::new(),
        )
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = TaskLedger::new(dir.path().join("download_state_alpha.json"));

        let mut tasks = vec![sample_task("a.pdf"), sample_task("b.pdf")];
        tasks[1].status = TaskStatus::Completed;
        tasks[1].attempts = 1;

        ledger.save(&tasks).await.unwrap();
        let loaded = ledger.load().await.unwrap();

        assert_eq!(loaded, tasks);
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = TaskLedger::new(dir.path().join("nope.json"));

        assert!(ledger.load().await.is_none());
    }

    #[tokio::test]
    async fn test_load_corrupt_file_returns_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("download_state_alpha.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let ledger = TaskLedger::new(&path);
        assert!(ledger.load().await.is_none());
    }

    #[tokio::test]
    async fn test_save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("nested").join("ledger.json");

        let ledger = TaskLedger::new(&path);
        ledger.save(&[sample_task("a.pdf")]).await.unwrap();

        assert!(path.is_file());
    }

    #[tokio::test]
    async fn test_saved_ledger_is_human_readable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");

        let ledger = TaskLedger::new(&path);
        ledger.save(&[sample_task("a.pdf")]).await.unwrap();

        let raw = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(raw.contains('\n'));
        assert!(raw.contains("\"status\": \"pending\""));
    }

    #[test]
    fn test_default_file_name_embeds_label() {
        assert_eq!(
            TaskLedger::default_file_name("finance"),
            "download_state_finance.json"
        );
    }
}
