//! Chunked retry driver.
//!
//! Each chunk of the job range goes through two passes at most:
//! 1. Every record of the chunk at the configured worker count
//! 2. Only the records that failed, once more, at [`RETRY_WORKERS`]
//!
//! Chunks run one after another. Records that fail the second pass are
//! collected for the final summary and never tried again.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tracing::{Instrument, error, info, info_span, warn};

use super::{BatchExecutor, ChunkReport, RunSummary};
use crate::config::{ExecutionContext, RETRY_WORKERS, RunConfig};
use crate::records::{self, JobRange};
use crate::runner::Provisioner;

/// Drives a whole run chunk by chunk.
pub struct RetryDriver<P> {
    executor: BatchExecutor<P>,
    context: Arc<ExecutionContext>,
    chunk_size: u32,
    workers: usize,
    retry_workers: usize,
}

impl<P: Provisioner> RetryDriver<P> {
    #[must_use]
    pub fn new(provisioner: Arc<P>, config: &RunConfig) -> Self {
        Self {
            executor: BatchExecutor::new(provisioner),
            context: Arc::clone(&config.context),
            chunk_size: config.chunk_size,
            workers: config.workers,
            retry_workers: RETRY_WORKERS,
        }
    }

    /// Provisions every record of `range`.
    pub async fn run(&self, range: JobRange) -> RunSummary {
        let started_at = Utc::now();
        let timer = Instant::now();

        info!(
            "Starting {} for {} records {} of '{}' (chunk size {}, {} workers)",
            self.context.mode,
            range.len(),
            range,
            self.context.base_name,
            self.chunk_size,
            self.workers
        );

        let mut chunks = Vec::new();
        let mut permanently_failed = Vec::new();

        for chunk in range.chunks(self.chunk_size) {
            let span = info_span!("chunk", range = %chunk);
            let report = self.run_chunk(chunk).instrument(span).await;
            permanently_failed.extend(report.permanently_failed());
            chunks.push(report);
        }

        let elapsed = timer.elapsed();
        info!("Finished in {:.2}s", elapsed.as_secs_f64());

        if !permanently_failed.is_empty() {
            error!(
                "{} records failed twice: {}",
                permanently_failed.len(),
                permanently_failed.join(", ")
            );
        }

        RunSummary {
            mode: self.context.mode,
            base_name: self.context.base_name.clone(),
            range,
            chunk_size: self.chunk_size,
            workers: self.workers,
            started_at,
            finished_at: Utc::now(),
            elapsed_secs: elapsed.as_secs_f64(),
            chunks,
            permanently_failed,
        }
    }

    async fn run_chunk(&self, chunk: JobRange) -> ChunkReport {
        info!("Chunk {} started ({} records)", chunk, chunk.len());

        let first_pass = self
            .executor
            .run(self.workers, records::records(&self.context, chunk))
            .await;

        let retry = if first_pass.failed.is_empty() {
            None
        } else {
            warn!(
                "Retrying {} failed records with {} workers: {}",
                first_pass.failed.len(),
                self.retry_workers,
                first_pass.failed_names().join(", ")
            );
            Some(
                self.executor
                    .run(self.retry_workers, first_pass.failed.clone())
                    .await,
            )
        };

        info!(
            "Chunk {} done: {} ok, {} failed, {} recovered on retry",
            chunk,
            first_pass.succeeded,
            first_pass.failed.len(),
            retry.as_ref().map_or(0, |r| r.succeeded)
        );

        ChunkReport {
            range: chunk,
            first_pass,
            retry,
        }
    }
}

impl<P> std::fmt::Debug for RetryDriver<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryDriver")
            .field("chunk_size", &self.chunk_size)
            .field("workers", &self.workers)
            .field("retry_workers", &self.retry_workers)
            .finish_non_exhaustive()
    }
}
