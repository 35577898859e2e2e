//! External tool settings.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Locations and fixed inputs of the external tools the runners call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Directory management CLI (`ipa`).
    #[serde(default = "default_ipa_program")]
    pub ipa_program: PathBuf,

    /// Kerberos ticket tool (`kinit`).
    #[serde(default = "default_kinit_program")]
    pub kinit_program: PathBuf,

    /// Directory for per-record credential cache files.
    #[serde(default = "default_ccache_dir")]
    pub ccache_dir: PathBuf,

    /// Temporary password set before the user changes it through kinit.
    #[serde(default = "default_placeholder_password")]
    pub placeholder_password: String,
}

fn default_ipa_program() -> PathBuf {
    PathBuf::from("ipa")
}

fn default_kinit_program() -> PathBuf {
    PathBuf::from("kinit")
}

fn default_ccache_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

fn default_placeholder_password() -> String {
    "Placeholder-123".to_owned()
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            ipa_program: default_ipa_program(),
            kinit_program: default_kinit_program(),
            ccache_dir: default_ccache_dir(),
            placeholder_password: default_placeholder_password(),
        }
    }
}

impl ToolSettings {
    /// Creates tool settings from environment variables with defaults.
    ///
    /// Reads `PROVISION_IPA_BIN`, `PROVISION_KINIT_BIN`,
    /// `PROVISION_CCACHE_DIR` and `PROVISION_PLACEHOLDER_PASSWORD`.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self {
            ipa_program: env_non_empty("PROVISION_IPA_BIN")
                .map_or_else(default_ipa_program, PathBuf::from),
            kinit_program: env_non_empty("PROVISION_KINIT_BIN")
                .map_or_else(default_kinit_program, PathBuf::from),
            ccache_dir: env_non_empty("PROVISION_CCACHE_DIR")
                .map_or_else(default_ccache_dir, PathBuf::from),
            placeholder_password: env_non_empty("PROVISION_PLACEHOLDER_PASSWORD")
                .unwrap_or_else(default_placeholder_password),
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
