//! # Transfer Engine
//!
//! Fetches one task's content to its local destination, with bounded
//! retries and a fixed delay between attempts.
//!
//! ## Overview
//!
//! The engine never fails the run: each transfer resolves to a
//! [`TransferResult`] that the caller folds back into the task ledger.
//! Retry pacing is delegated to an injected [`Sleeper`] so tests run
//! without waiting out real delays.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use core_remote::source::RemoteSource;
use core_remote::time::Sleeper;

use crate::model::{is_native_document, Task, TransferOutcome, TransferResult};

/// Retry schedule for one task's transfer attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts per task, including the first
    pub max_attempts: u32,
    /// Fixed pause between consecutive attempts
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(5),
        }
    }
}

/// Downloads or exports tasks one at a time
pub struct TransferEngine {
    policy: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl TransferEngine {
    /// Create an engine with the given retry policy
    ///
    /// A `max_attempts` of zero is treated as one; every task gets at
    /// least a single attempt.
    pub fn new(policy: RetryPolicy, sleeper: Arc<dyn Sleeper>) -> Self {
        let policy = RetryPolicy {
            max_attempts: policy.max_attempts.max(1),
            ..policy
        };
        Self { policy, sleeper }
    }

    /// Transfer one task into the downloads tree
    ///
    /// The destination is the task's expected local path under
    /// `downloads_dir`. Provider-native documents are exported as PDF;
    /// everything else is downloaded byte for byte. Attempts stop at the
    /// first success, and the delay is only slept between attempts,
    /// never after the last one.
    #[instrument(skip(self, source, task), fields(path = %task.relative_path))]
    pub async fn transfer(
        &self,
        source: &dyn RemoteSource,
        task: &Task,
        downloads_dir: &Path,
    ) -> TransferResult {
        let dest = long_path_safe(&downloads_dir.join(task.expected_local_rel_path()));

        if let Some(parent) = dest.parent() {
            if let Err(err) = tokio::fs::create_dir_all(parent).await {
                warn!(
                    dest = %dest.display(),
                    error = %err,
                    "Could not create destination directory"
                );
                return TransferResult {
                    outcome: TransferOutcome::Failure,
                    attempts: 0,
                    bytes_written: 0,
                    error_message: Some(format!(
                        "Could not create destination directory: {}",
                        err
                    )),
                };
            }
        }

        let export = is_native_document(&task.mime_type);
        let mut last_error = String::new();

        for attempt in 1..=self.policy.max_attempts {
            let fetched = if export {
                source.export_to(&task.drive_id, &dest).await
            } else {
                source.download_to(&task.drive_id, &dest).await
            };

            match fetched {
                Ok(bytes_written) => {
                    debug!(attempt, bytes_written, "Transfer succeeded");
                    return TransferResult {
                        outcome: TransferOutcome::Success,
                        attempts: attempt,
                        bytes_written,
                        error_message: None,
                    };
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts = self.policy.max_attempts,
                        error = %err,
                        "Transfer attempt failed"
                    );
                    last_error = err.to_string();
                    if attempt < self.policy.max_attempts {
                        self.sleeper.sleep(self.policy.delay).await;
                    }
                }
            }
        }

        TransferResult {
            outcome: TransferOutcome::Failure,
            attempts: self.policy.max_attempts,
            bytes_written: 0,
            error_message: Some(last_error),
        }
    }
}

/// Make a local path safe for deep directory trees
///
/// On Windows the verbatim `\\?\` prefix lifts the 260-character path
/// limit; sanitized remote trees routinely exceed it. Elsewhere the path
/// is returned unchanged.
pub(crate) fn long_path_safe(path: &Path) -> PathBuf {
    #[cfg(windows)]
    {
        let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
        let raw = absolute.as_os_str().to_string_lossy();
        if raw.starts_with(r"\\?\") {
            absolute
        } else {
            PathBuf::from(format!(r"\\?\{}", raw))
        }
    }
    #[cfg(not(windows))]
    {
        path.to_path_buf()
    }
}
