//! Per-run log file.
//!
//! A run logs to `<mode>.log` through its own [`Dispatch`] instead of a
//! process-wide subscriber. Futures attached with [`RunLogger::attach`]
//! log into the file; tasks they spawn must carry the subscriber along
//! with `with_current_subscriber()`.

use std::fs::File;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Dispatch;
use tracing::instrument::{WithDispatch, WithSubscriber};
use tracing_subscriber::EnvFilter;

use crate::config::Mode;

/// Log destination of one run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    dispatch: Dispatch,
    path: PathBuf,
}

impl RunLogger {
    /// Creates (or truncates) `<dir>/<mode>.log` and a subscriber writing to it.
    ///
    /// `RUST_LOG` takes precedence over `level`.
    ///
    /// # Errors
    ///
    /// Returns an error if the log file cannot be created.
    pub fn create(dir: &Path, mode: Mode, level: &str) -> io::Result<Self> {
        let path = dir.join(mode.log_file_name());
        let file = File::create(&path)?;

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_ansi(false)
            .with_writer(Arc::new(file))
            .finish();

        Ok(Self {
            dispatch: Dispatch::new(subscriber),
            path,
        })
    }

    /// Path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs `future` with this logger as its subscriber.
    pub fn attach<F: Future>(&self, future: F) -> WithDispatch<F> {
        future.with_subscriber(self.dispatch.clone())
    }
}
