//! # CLI Configuration
//!
//! Loads `driveport.toml` and converts it into the pipeline's runtime
//! configuration. Every field has a default, so a missing file or a
//! partial file both work.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use core_extract::walker::WalkErrorPolicy;
use core_extract::{default_ignored_mime_types, ExtractConfig, RetryPolicy};

/// Top-level configuration file contents
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Label naming this extraction; embedded in state and report file names
    pub label: String,
    /// OAuth credential file with a refresh token
    pub credentials_file: PathBuf,
    /// Where transferred files land
    pub downloads_dir: PathBuf,
    /// Where finished archives land
    pub backups_dir: PathBuf,
    /// Where the ledger and backlog reports live
    pub state_dir: PathBuf,
    /// MIME types never transferred
    pub ignored_mime_types: Vec<String>,
    /// Transfer retry schedule
    pub retry: RetryConfig,
    /// Logging controls
    pub log: LogConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            label: "default".to_string(),
            credentials_file: PathBuf::from("credentials.json"),
            downloads_dir: PathBuf::from("downloads"),
            backups_dir: PathBuf::from("backups"),
            state_dir: PathBuf::from("state"),
            ignored_mime_types: default_ignored_mime_types().into_iter().collect(),
            retry: RetryConfig::default(),
            log: LogConfig::default(),
        }
    }
}

/// Transfer retry schedule
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts per task, including the first
    pub max_attempts: u32,
    /// Fixed pause between attempts, in seconds
    pub delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay_secs: 5,
        }
    }
}

/// Logging controls
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Base level for driveport crates when no filter is given
    pub level: Option<String>,
    /// Full tracing filter directive, overrides `level` entirely
    pub filter: Option<String>,
    /// Output format on stderr
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human-readable output
    #[default]
    Compact,
    /// Newline-delimited JSON for log shippers
    Json,
}

impl AppConfig {
    /// Load configuration from a TOML file
    ///
    /// A missing file yields the defaults; a present but malformed file
    /// is an error, since silently ignoring it would run with the wrong
    /// directories.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => toml::from_str(&raw)
                .with_context(|| format!("Malformed config file {}", path.display())),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => {
                Err(err).with_context(|| format!("Could not read config file {}", path.display()))
            }
        }
    }

    /// Build the pipeline configuration for one run
    pub fn extract_config(&self, strict_walk: bool) -> ExtractConfig {
        ExtractConfig {
            label: self.label.clone(),
            downloads_dir: self.downloads_dir.clone(),
            backups_dir: self.backups_dir.clone(),
            state_dir: self.state_dir.clone(),
            ignored_mime_types: self.ignored_mime_types.iter().cloned().collect(),
            walk_error_policy: if strict_walk {
                WalkErrorPolicy::Strict
            } else {
                WalkErrorPolicy::Lenient
            },
            retry: RetryPolicy {
                max_attempts: self.retry.max_attempts,
                delay: Duration::from_secs(self.retry.delay_secs),
            },
        }
    }
}
