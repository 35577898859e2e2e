//! Configuration module for the provisioning tool.
//!
//! Handles command-line arguments, validation of the run configuration,
//! and tool settings read from the environment.

mod args;
mod run;
mod settings;

pub use args::ProvisionArgs;
pub use run::{ConfigError, ExecutionContext, Mode, RunConfig, Secret, clamp_workers};
pub use settings::ToolSettings;

/// Worker count used when the requested one is out of range.
pub const DEFAULT_WORKERS: usize = 5;

/// Exclusive upper bound for the requested worker count.
pub const MAX_WORKERS: usize = 10;

/// Worker count of the retry pass.
pub const RETRY_WORKERS: usize = 2;
