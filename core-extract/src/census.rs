//! # MIME Census
//!
//! Aggregates a full-inventory walk into per-MIME-type counts, the
//! pre-migration reconnaissance report.

use std::collections::BTreeMap;
use std::fmt;

use crate::model::RemoteEntry;

/// Per-MIME-type entry counts for one remote tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeCensus {
    counts: BTreeMap<String, usize>,
}

impl MimeCensus {
    /// Count every entry by its MIME type
    pub fn tally(entries: &[RemoteEntry]) -> Self {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for entry in entries {
            *counts.entry(entry.mime_type.clone()).or_default() += 1;
        }
        Self { counts }
    }

    /// Total entries counted
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Whether anything was counted
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Rows sorted by descending count, ties broken by MIME type
    pub fn rows(&self) -> Vec<(&str, usize)> {
        let mut rows: Vec<(&str, usize)> = self
            .counts
            .iter()
            .map(|(mime, count)| (mime.as_str(), *count))
            .collect();
        // Stable sort keeps the map's name order within equal counts.
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        rows
    }
}

impl fmt::Display for MimeCensus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<60} | {:>6}", "MIME type", "Count")?;
        writeln!(f, "{:-<60}-+-{:->6}", "", "")?;
        for (mime, count) in self.rows() {
            writeln!(f, "{:<60} | {:>6}", mime, count)?;
        }
        write!(f, "{:<60} | {:>6}", "Total", self.total())
    }
}
