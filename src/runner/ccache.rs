//! Scoped Kerberos credential cache files.

use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// A per-record credential cache file that is removed when dropped.
///
/// kinit creates the file; the guard only owns its path, so dropping a
/// guard whose file was never written is fine.
#[derive(Debug)]
pub struct CredentialCache {
    path: PathBuf,
}

impl CredentialCache {
    /// Claims `<dir>/<record>.cc.tmp`.
    #[must_use]
    pub fn for_record(dir: &Path, record: &str) -> Self {
        Self {
            path: dir.join(format!("{record}.cc.tmp")),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The path as a command-line argument.
    #[must_use]
    pub fn arg(&self) -> String {
        self.path.display().to_string()
    }
}

impl Drop for CredentialCache {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed credential cache {}", self.path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to remove credential cache {}: {}",
                self.path.display(),
                e
            ),
        }
    }
}
