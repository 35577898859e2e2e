//! Bulk Provision - Main Entry Point
//!
//! Creates or activates a numbered range of users, hosts or groups,
//! chunk by chunk, logging every result to `<mode>.log`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing::{debug, info, warn};

use bulk_provision::config::{ProvisionArgs, RunConfig, ToolSettings};
use bulk_provision::executor::{RetryDriver, RunSummary};
use bulk_provision::logging::RunLogger;
use bulk_provision::runner::{ClassifyPolicy, DirectoryProvisioner};

/// Bulk provisioning of directory users, hosts and groups.
#[derive(Parser, Debug)]
#[command(name = "provision")]
#[command(about = "Create or activate a numbered range of directory records")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    run: ProvisionArgs,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Directory for the `<mode>.log` file.
    #[arg(long, default_value = ".")]
    log_dir: PathBuf,

    /// Also treat a non-zero exit status as a failure.
    #[arg(long)]
    strict_exit: bool,

    /// Write a JSON summary of the run to this path.
    #[arg(long)]
    report: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match RunConfig::from_args(&cli.run) {
        Ok(config) => config,
        Err(e) => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
    };

    let env_loaded = dotenvy::from_filename(&cli.env_file);
    let settings = ToolSettings::from_env_with_defaults();

    let logger = RunLogger::create(&cli.log_dir, config.context.mode, &cli.log_level)
        .context("Failed to create log file")?;

    let summary = logger
        .attach(async {
            if let Err(e) = &env_loaded {
                debug!("Could not load .env file ({}): {}", cli.env_file.display(), e);
            }
            if config.workers != cli.run.threads {
                warn!(
                    "Worker count {} out of range, using {}",
                    cli.run.threads, config.workers
                );
            }
            run(&config, settings, cli.strict_exit).await
        })
        .await;

    if let Some(path) = &cli.report {
        summary
            .save(path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
    }

    Ok(())
}

/// Provisions the configured range.
async fn run(config: &RunConfig, settings: ToolSettings, strict_exit: bool) -> RunSummary {
    let policy = if strict_exit {
        ClassifyPolicy::Strict
    } else {
        ClassifyPolicy::StderrOnly
    };
    debug!("Tool settings: {:?}, classification: {:?}", settings, policy);

    let provisioner =
        DirectoryProvisioner::new(Arc::clone(&config.context), settings).with_policy(policy);
    let driver = RetryDriver::new(Arc::new(provisioner), config);

    let summary = driver.run(config.range).await;
    info!(
        "{} of {} records provisioned, {} retried",
        summary.provisioned(),
        summary.range.len(),
        summary.retried()
    );
    summary
}
