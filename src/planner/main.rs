//! Standalone planner for provisioning runs.
//!
//! Validates the same arguments as `provision` and prints the chunks and
//! records a run would process, without calling any external tool.

use std::process::ExitCode;

use clap::Parser;

use bulk_provision::config::{DEFAULT_WORKERS, MAX_WORKERS, ProvisionArgs, RETRY_WORKERS, RunConfig};
use bulk_provision::records::{self, Record};

/// Provisioning run planner.
#[derive(Parser, Debug)]
#[command(name = "provision_plan")]
#[command(about = "Shows the chunks and records a provisioning run would process")]
#[command(version)]
struct Args {
    #[command(flatten)]
    run: ProvisionArgs,

    /// List every record of every chunk.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match RunConfig::from_args(&args.run) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ Invalid arguments: {e}");
            return ExitCode::FAILURE;
        }
    };

    print_plan(&config, args.run.threads, args.verbose);
    ExitCode::SUCCESS
}

fn print_plan(config: &RunConfig, requested_workers: usize, verbose: bool) {
    let context = &config.context;

    println!("Mode:    {}", context.mode);
    println!("Records: {} {} of '{}'", config.range.len(), config.range, context.base_name);
    if let Some(domain) = &context.domain {
        println!("Domain:  {domain}");
    }
    if context.password.is_some() {
        println!("Password: (set)");
    }

    if config.workers == requested_workers {
        println!("Workers: {} (retry pass: {RETRY_WORKERS})", config.workers);
    } else {
        println!(
            "Workers: {} (requested {requested_workers} is outside 1..{MAX_WORKERS}, using {DEFAULT_WORKERS}; retry pass: {RETRY_WORKERS})",
            config.workers
        );
    }
    println!();

    let mut chunk_count = 0;
    for chunk in config.range.chunks(config.chunk_size) {
        chunk_count += 1;
        println!("Chunk {chunk_count}: {chunk} ({} records)", chunk.len());

        if verbose {
            for record in records::records(context, chunk) {
                println!("  {}", describe(&record));
            }
        }
    }

    println!();
    if chunk_count == 0 {
        println!("✓ Nothing to do: the range is empty");
    } else {
        println!(
            "✓ {} records in {chunk_count} chunk(s) of up to {}",
            config.range.len(),
            config.chunk_size
        );
    }
}

fn describe(record: &Record) -> String {
    match record.ip {
        Some(ip) => format!("{} -> {ip}", record.name),
        None => record.name.clone(),
    }
}
