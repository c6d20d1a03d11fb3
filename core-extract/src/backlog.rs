//! # Backlog Reporting
//!
//! Writes the per-run CSV report of every attempted transfer.
//!
//! ## Overview
//!
//! The backlog is meant for spreadsheet consumption by non-developers, so
//! it starts with a UTF-8 byte order mark and uses plain comma-separated
//! values. One row per attempted task; runs that attempt nothing produce
//! no file at all.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::{ExtractError, Result};
use crate::model::BacklogRecord;

/// Byte order mark that makes spreadsheet tools decode the file as UTF-8
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Conventional backlog file name for a label on a given day
pub fn backlog_file_name(label: &str, now: DateTime<Utc>) -> String {
    format!("backlog_{}_{}.csv", label, now.format("%Y-%m-%d"))
}

/// Write this run's backlog, replacing any earlier file from the same day
///
/// Returns the written path, or `None` when there were no records to
/// report.
///
/// # Errors
///
/// Returns [`ExtractError::BacklogWrite`] when the file cannot be created
/// or a record cannot be serialized.
pub fn write_backlog(
    records: &[BacklogRecord],
    dir: &Path,
    label: &str,
    now: DateTime<Utc>,
) -> Result<Option<PathBuf>> {
    if records.is_empty() {
        debug!("No transfer attempts this run, skipping backlog");
        return Ok(None);
    }

    let path = dir.join(backlog_file_name(label, now));
    let write_error = |message: String| ExtractError::BacklogWrite {
        path: path.display().to_string(),
        message,
    };

    std::fs::create_dir_all(dir).map_err(|e| write_error(e.to_string()))?;
    let mut file = File::create(&path).map_err(|e| write_error(e.to_string()))?;
    file.write_all(UTF8_BOM).map_err(|e| write_error(e.to_string()))?;

    let mut writer = csv::Writer::from_writer(file);
    for record in records {
        writer.serialize(record).map_err(|e| write_error(e.to_string()))?;
    }
    writer.flush().map_err(|e| write_error(e.to_string()))?;

    info!(path = %path.display(), records = records.len(), "Wrote backlog report");
    Ok(Some(path))
}
