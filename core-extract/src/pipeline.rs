//! # Extraction Pipeline
//!
//! Orchestrates one full extraction run: plan, scaffold, transfer,
//! persist, verify, package.
//!
//! ## Overview
//!
//! The pipeline is strictly sequential and idempotent. Planning reuses
//! the task ledger when one exists, so re-running after an interruption
//! never re-walks the remote tree and never re-fetches completed work.
//! Every stage folds its results back into the ledger before the run
//! ends, which is what makes the next run resumable.
//!
//! ## Stage Order
//!
//! ```text
//! plan → scaffold → transfer pass → save ledger → backlog
//!      → verify → package backup (only when verification passes)
//! ```

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, instrument, warn};

use core_remote::source::RemoteSource;
use core_remote::time::{Clock, Sleeper};

use crate::backlog;
use crate::backup;
use crate::census::MimeCensus;
use crate::error::{ExtractError, Result};
use crate::ledger::TaskLedger;
use crate::model::{BacklogRecord, Task, TaskStatus, TransferOutcome};
use crate::transfer::{long_path_safe, RetryPolicy, TransferEngine};
use crate::verify;
use crate::walker::{self, WalkErrorPolicy, WalkMode, WalkOptions};

// ============================================================================
// Configuration
// ============================================================================

/// MIME types no run should ever try to transfer
///
/// Shortcuts are pointers to files owned elsewhere; following them would
/// duplicate content outside the chosen tree.
pub fn default_ignored_mime_types() -> BTreeSet<String> {
    BTreeSet::from(["application/vnd.google-apps.shortcut".to_string()])
}

/// Everything one extraction run needs to know besides the root folder
#[derive(Debug, Clone)]
pub struct ExtractConfig {
    /// Label naming this extraction; embedded in ledger, backlog and
    /// archive file names
    pub label: String,
    /// Where transferred files land
    pub downloads_dir: PathBuf,
    /// Where finished archives land
    pub backups_dir: PathBuf,
    /// Where the ledger and backlog reports live
    pub state_dir: PathBuf,
    /// MIME types classified as `Ignored` at planning time
    pub ignored_mime_types: BTreeSet<String>,
    /// How walk failures are handled
    pub walk_error_policy: WalkErrorPolicy,
    /// Retry schedule for transfers
    pub retry: RetryPolicy,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            label: "default".to_string(),
            downloads_dir: PathBuf::from("downloads"),
            backups_dir: PathBuf::from("backups"),
            state_dir: PathBuf::from("state"),
            ignored_mime_types: default_ignored_mime_types(),
            walk_error_policy: WalkErrorPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Summary of one extraction run
#[derive(Debug, Clone, Default)]
pub struct ExtractOutcome {
    /// Tasks in the plan, whatever their status
    pub planned: usize,
    /// Tasks transferred by this run
    pub transferred: usize,
    /// Pending tasks completed by finding their file already on disk
    pub resumed: usize,
    /// Tasks already completed before this run
    pub skipped: usize,
    /// Tasks left `Failed` at the end of the pass, whether their
    /// attempts were exhausted this run or an earlier one
    pub failed: usize,
    /// Tasks excluded by MIME type
    pub ignored: usize,
    /// Whether verification found every expected file
    pub verified: bool,
    /// Expected paths missing locally, sorted
    pub missing: Vec<String>,
    /// Folders the planning walk could not list
    pub failed_folders: usize,
    /// The archive written when verification passed
    pub backup_path: Option<PathBuf>,
}

#[derive(Debug, Default)]
struct PassCounters {
    transferred: usize,
    resumed: usize,
    skipped: usize,
    failed: usize,
    ignored: usize,
}

// ============================================================================
// Pipeline
// ============================================================================

/// Sequential extraction pipeline over one remote source
pub struct ExtractPipeline {
    source: Arc<dyn RemoteSource>,
    engine: TransferEngine,
    clock: Arc<dyn Clock>,
    config: ExtractConfig,
}

impl ExtractPipeline {
    /// Build a pipeline over a source with injected time collaborators
    pub fn new(
        source: Arc<dyn RemoteSource>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
        config: ExtractConfig,
    ) -> Self {
        let engine = TransferEngine::new(config.retry, sleeper);
        Self {
            source,
            engine,
            clock,
            config,
        }
    }

    /// Run one full extraction of the tree rooted at `root_folder_id`
    ///
    /// # Errors
    ///
    /// Individual transfer failures never fail the run; they are recorded
    /// in the ledger and counted in the outcome. The run itself fails on
    /// a strict-walk abort, an unsaveable ledger or an unscannable
    /// downloads tree.
    #[instrument(skip(self), fields(label = %self.config.label))]
    pub async fn run(&self, root_folder_id: &str) -> Result<ExtractOutcome> {
        let started = Instant::now();
        info!(root_folder_id, "Starting extraction run");

        let (mut tasks, failed_folders) = self.plan(root_folder_id).await?;
        self.scaffold(&tasks).await?;

        let (counters, records) = self.run_pass(&mut tasks).await;
        self.ledger().save(&tasks).await?;

        self.write_backlog(records).await?;

        let expected = verify::expected_paths(&tasks);
        let downloads_dir = self.config.downloads_dir.clone();
        let actual = tokio::task::spawn_blocking(move || verify::scan_local(&downloads_dir))
            .await
            .map_err(|e| ExtractError::Background(e.to_string()))??;
        let report = verify::verify(&expected, &actual);

        let backup_path = if report.is_complete() {
            info!(
                expected = report.expected_count,
                found = report.actual_count,
                "Verification passed"
            );
            self.package_backup().await?
        } else {
            warn!(
                missing = report.missing.len(),
                expected = report.expected_count,
                "Verification found missing files, skipping backup"
            );
            for path in &report.missing {
                warn!(path = %path, "Expected file missing locally");
            }
            None
        };

        let outcome = ExtractOutcome {
            planned: tasks.len(),
            transferred: counters.transferred,
            resumed: counters.resumed,
            skipped: counters.skipped,
            failed: counters.failed,
            ignored: counters.ignored,
            verified: report.is_complete(),
            missing: report.missing,
            failed_folders,
            backup_path,
        };

        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            planned = outcome.planned,
            transferred = outcome.transferred,
            resumed = outcome.resumed,
            skipped = outcome.skipped,
            failed = outcome.failed,
            ignored = outcome.ignored,
            verified = outcome.verified,
            "Extraction run finished"
        );
        Ok(outcome)
    }

    /// Plan and scaffold without transferring anything
    ///
    /// Leaves the ledger and the local directory skeleton in place, so a
    /// later full run starts exactly where this one stopped.
    #[instrument(skip(self), fields(label = %self.config.label))]
    pub async fn scaffold_only(&self, root_folder_id: &str) -> Result<ExtractOutcome> {
        let (tasks, failed_folders) = self.plan(root_folder_id).await?;
        self.scaffold(&tasks).await?;

        info!(planned = tasks.len(), "Scaffold complete, no transfers requested");
        Ok(ExtractOutcome {
            planned: tasks.len(),
            failed_folders,
            ..ExtractOutcome::default()
        })
    }

    /// Count every entry in the tree by MIME type, without transferring
    #[instrument(skip(self), fields(label = %self.config.label))]
    pub async fn census(&self, root_folder_id: &str) -> Result<MimeCensus> {
        let options = WalkOptions {
            mode: WalkMode::FullInventory,
            error_policy: self.config.walk_error_policy,
        };
        let report = walker::walk(self.source.as_ref(), root_folder_id, &options).await?;

        if !report.failed_folders.is_empty() {
            warn!(
                failed_folders = report.failed_folders.len(),
                "Census is incomplete, some folders could not be listed"
            );
        }

        Ok(MimeCensus::tally(&report.entries))
    }

    fn ledger(&self) -> TaskLedger {
        TaskLedger::new(
            self.config
                .state_dir
                .join(TaskLedger::default_file_name(&self.config.label)),
        )
    }

    /// Produce the task list, from the ledger when present, from a fresh
    /// walk otherwise
    async fn plan(&self, root_folder_id: &str) -> Result<(Vec<Task>, usize)> {
        let ledger = self.ledger();
        if let Some(tasks) = ledger.load().await {
            info!(count = tasks.len(), "Resuming from existing ledger");
            return Ok((tasks, 0));
        }

        let options = WalkOptions {
            mode: WalkMode::FilesOnly,
            error_policy: self.config.walk_error_policy,
        };
        let report = walker::walk(self.source.as_ref(), root_folder_id, &options).await?;
        let failed_folders = report.failed_folders.len();

        let tasks: Vec<Task> = report
            .entries
            .into_iter()
            .map(|entry| Task::from_entry(entry, &self.config.ignored_mime_types))
            .collect();
        ledger.save(&tasks).await?;

        info!(
            count = tasks.len(),
            failed_folders, "Planned extraction from remote walk"
        );
        Ok((tasks, failed_folders))
    }

    /// Create the downloads root and every directory a task will write into
    async fn scaffold(&self, tasks: &[Task]) -> Result<()> {
        let mut dirs: BTreeSet<PathBuf> = BTreeSet::new();
        dirs.insert(self.config.downloads_dir.clone());

        for task in tasks {
            if task.status == TaskStatus::Ignored {
                continue;
            }
            if let Some((dir, _)) = task.expected_local_rel_path().rsplit_once('/') {
                dirs.insert(self.config.downloads_dir.join(dir));
            }
        }

        let count = dirs.len();
        for dir in dirs {
            tokio::fs::create_dir_all(long_path_safe(&dir)).await?;
        }

        debug!(count, "Scaffolded local directories");
        Ok(())
    }

    /// Walk the plan once, transferring whatever still needs it
    ///
    /// Only pending tasks transfer. Completed and ignored tasks are
    /// passed over, as are failed ones: their attempts were exhausted in
    /// an earlier pass, and retrying them means rebuilding the plan. A
    /// pending task whose expected file already exists locally is
    /// flipped to completed without touching the network.
    async fn run_pass(&self, tasks: &mut [Task]) -> (PassCounters, Vec<BacklogRecord>) {
        let mut counters = PassCounters::default();
        let mut records = Vec::new();

        for task in tasks.iter_mut() {
            match task.status {
                TaskStatus::Completed => {
                    counters.skipped += 1;
                    continue;
                }
                TaskStatus::Ignored => {
                    counters.ignored += 1;
                    continue;
                }
                TaskStatus::Failed => {
                    debug!(path = %task.relative_path, "Previously failed, not retried");
                    counters.failed += 1;
                    continue;
                }
                TaskStatus::Pending => {
                    let local = long_path_safe(
                        &self.config.downloads_dir.join(task.expected_local_rel_path()),
                    );
                    let present = tokio::fs::metadata(&local)
                        .await
                        .map(|m| m.is_file())
                        .unwrap_or(false);
                    if present {
                        debug!(path = %task.relative_path, "Already on disk, marking completed");
                        task.status = TaskStatus::Completed;
                        counters.resumed += 1;
                        continue;
                    }
                }
            }

            let result = self
                .engine
                .transfer(self.source.as_ref(), task, &self.config.downloads_dir)
                .await;

            task.attempts = result.attempts;
            match result.outcome {
                TransferOutcome::Success => {
                    task.status = TaskStatus::Completed;
                    task.error_message = None;
                    counters.transferred += 1;
                }
                TransferOutcome::Failure => {
                    task.status = TaskStatus::Failed;
                    task.error_message = result.error_message.clone();
                    counters.failed += 1;
                }
            }
            records.push(BacklogRecord::from_attempt(task, &result, self.clock.now()));
        }

        (counters, records)
    }

    /// Write the run's backlog on a blocking thread
    ///
    /// A failed backlog write is logged, not fatal; the ledger already
    /// holds the authoritative state.
    async fn write_backlog(&self, records: Vec<BacklogRecord>) -> Result<()> {
        let dir = self.config.state_dir.clone();
        let label = self.config.label.clone();
        let now = self.clock.now();

        let written = tokio::task::spawn_blocking(move || {
            backlog::write_backlog(&records, &dir, &label, now)
        })
        .await
        .map_err(|e| ExtractError::Background(e.to_string()))?;

        if let Err(err) = written {
            warn!(error = %err, "Backlog write failed");
        }
        Ok(())
    }

    /// Pack the downloads tree on a blocking thread
    ///
    /// Packaging failures are logged, not fatal; the downloads tree is
    /// already verified complete at this point.
    async fn package_backup(&self) -> Result<Option<PathBuf>> {
        let source_dir = self.config.downloads_dir.clone();
        let backups_dir = self.config.backups_dir.clone();
        let label = self.config.label.clone();
        let now = self.clock.now();

        let packed = tokio::task::spawn_blocking(move || {
            backup::pack(&source_dir, &backups_dir, &label, now)
        })
        .await
        .map_err(|e| ExtractError::Background(e.to_string()))?;

        match packed {
            Ok(path) => Ok(Some(path)),
            Err(err) => {
                warn!(error = %err, "Backup packaging failed");
                Ok(None)
            }
        }
    }
}
