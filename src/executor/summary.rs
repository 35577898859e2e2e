//! Run summary.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::BatchReport;
use crate::config::Mode;
use crate::records::JobRange;

/// Passes run for one chunk.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkReport {
    pub range: JobRange,
    pub first_pass: BatchReport,
    /// Present only when the first pass had failures.
    pub retry: Option<BatchReport>,
}

impl ChunkReport {
    /// Records of this chunk that failed both passes.
    #[must_use]
    pub fn permanently_failed(&self) -> Vec<String> {
        self.retry
            .as_ref()
            .map(BatchReport::failed_names)
            .unwrap_or_default()
    }
}

/// Everything a finished run did.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub mode: Mode,
    pub base_name: String,
    pub range: JobRange,
    pub chunk_size: u32,
    pub workers: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: f64,
    pub chunks: Vec<ChunkReport>,
    /// Records that failed their first attempt and their retry.
    pub permanently_failed: Vec<String>,
}

impl RunSummary {
    /// Number of records that needed a retry.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.chunks
            .iter()
            .filter_map(|c| c.retry.as_ref())
            .map(|r| r.attempted)
            .sum()
    }

    /// Number of records that ended up provisioned.
    #[must_use]
    pub fn provisioned(&self) -> usize {
        self.range.len() - self.permanently_failed.len()
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.permanently_failed.is_empty()
    }

    /// Saves the summary to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}
