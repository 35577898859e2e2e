//! Batch execution module.
//!
//! Runs the provisioner over the job range in sequential chunks, each
//! chunk with bounded concurrency and a single reduced-concurrency retry.

mod batch;
mod driver;
mod summary;

pub use batch::{BatchExecutor, BatchReport};
pub use driver::RetryDriver;
pub use summary::{ChunkReport, RunSummary};
