//! Run configuration and validation.

use std::fmt;
use std::sync::Arc;

use clap::ValueEnum;
use serde::Serialize;
use thiserror::Error;

use super::{DEFAULT_WORKERS, MAX_WORKERS, ProvisionArgs};
use crate::records::{HOST_INDEX_LIMIT, JobRange};

/// Errors that can occur while validating the run arguments.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Mode {mode} requires a DNS domain as the 7th argument")]
    MissingDomain { mode: Mode },

    #[error("Mode {mode} requires a password as the 7th argument")]
    MissingPassword { mode: Mode },

    #[error("Start index {start} is greater than stop index {stop}")]
    InvertedRange { start: u32, stop: u32 },

    #[error("Chunk size must be greater than 0")]
    ZeroChunk,

    #[error("Host index range ends at {stop}, past the 10.10.0.0/16 limit of {limit}")]
    HostRangeTooLarge { stop: u32, limit: u32 },
}

/// Provisioning operation applied to every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
pub enum Mode {
    /// Create a user account.
    #[value(name = "usermk")]
    #[serde(rename = "usermk")]
    UserCreate,

    /// Create a host and its DNS A-record.
    #[value(name = "hostmk")]
    #[serde(rename = "hostmk")]
    HostCreate,

    /// Create a group.
    #[value(name = "groupmk")]
    #[serde(rename = "groupmk")]
    GroupCreate,

    /// Reset a user password and change it through kinit.
    #[value(name = "useract")]
    #[serde(rename = "useract")]
    UserActivate,

    /// Obtain a Kerberos ticket for a user.
    #[value(name = "userauth")]
    #[serde(rename = "userauth")]
    UserAuthenticate,
}

impl Mode {
    /// The command-line keyword of this mode.
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::UserCreate => "usermk",
            Self::HostCreate => "hostmk",
            Self::GroupCreate => "groupmk",
            Self::UserActivate => "useract",
            Self::UserAuthenticate => "userauth",
        }
    }

    /// Name of the log file written for a run of this mode.
    #[must_use]
    pub fn log_file_name(self) -> String {
        format!("{}.log", self.keyword())
    }

    #[must_use]
    pub const fn needs_domain(self) -> bool {
        matches!(self, Self::HostCreate)
    }

    #[must_use]
    pub const fn needs_password(self) -> bool {
        matches!(self, Self::UserActivate | Self::UserAuthenticate)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A password that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    #[must_use]
    pub const fn new(value: String) -> Self {
        Self(value)
    }

    /// Returns the plaintext value.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Run-wide parameters shared read-only by every task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub mode: Mode,
    pub base_name: String,
    /// DNS zone (host mode only).
    pub domain: Option<String>,
    /// New user password (activation and authentication modes only).
    pub password: Option<Secret>,
}

/// Maps the requested worker count to the effective one.
///
/// Values in `1..MAX_WORKERS` pass through; anything else becomes
/// [`DEFAULT_WORKERS`].
#[must_use]
pub fn clamp_workers(requested: usize) -> usize {
    if (1..MAX_WORKERS).contains(&requested) {
        requested
    } else {
        DEFAULT_WORKERS
    }
}

/// A validated run configuration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub context: Arc<ExecutionContext>,
    pub range: JobRange,
    pub chunk_size: u32,
    pub workers: usize,
}

impl RunConfig {
    /// Validates the positional arguments and builds the execution context.
    ///
    /// # Errors
    ///
    /// Returns an error if the mode-specific argument is missing, the range
    /// is inverted, the chunk size is zero, or a host range exceeds the
    /// address space.
    pub fn from_args(args: &ProvisionArgs) -> Result<Self, ConfigError> {
        let mode = args.mode;

        let range = JobRange::new(args.start, args.stop).ok_or(ConfigError::InvertedRange {
            start: args.start,
            stop: args.stop,
        })?;

        if args.chunk == 0 {
            return Err(ConfigError::ZeroChunk);
        }

        let extra = args.extra.as_ref().filter(|s| !s.is_empty());

        let domain = if mode.needs_domain() {
            if range.stop > HOST_INDEX_LIMIT {
                return Err(ConfigError::HostRangeTooLarge {
                    stop: range.stop,
                    limit: HOST_INDEX_LIMIT,
                });
            }
            Some(extra.ok_or(ConfigError::MissingDomain { mode })?.clone())
        } else {
            None
        };

        let password = if mode.needs_password() {
            Some(Secret::new(
                extra.ok_or(ConfigError::MissingPassword { mode })?.clone(),
            ))
        } else {
            None
        };

        Ok(Self {
            context: Arc::new(ExecutionContext {
                mode,
                base_name: args.name.clone(),
                domain,
                password,
            }),
            range,
            chunk_size: args.chunk,
            workers: clamp_workers(args.threads),
        })
    }
}
