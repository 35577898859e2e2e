//! Bulk Provision Library
//!
//! Provisions users, hosts and groups in a directory service by running
//! one external command per record.
//!
//! This crate provides the core functionality for:
//! - Validating run arguments and building the execution context
//! - Generating record names and host addresses for an index range
//! - Running and classifying the external `ipa` and `kinit` commands
//! - Executing chunks concurrently with a single reduced-concurrency retry
//! - Writing a per-run log file

pub mod config;
pub mod executor;
pub mod logging;
pub mod records;
pub mod runner;
