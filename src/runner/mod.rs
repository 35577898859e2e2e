//! Command runner module.
//!
//! Runs the external directory and Kerberos tools for a single record
//! and classifies what they printed.

mod ccache;
mod output;
mod provisioner;

pub use ccache::CredentialCache;
pub use output::{ClassifyPolicy, CommandOutput, CommandSpec, TaskOutcome, run_command};
pub use provisioner::{DirectoryProvisioner, Provisioner};
