//! Startup configuration for the shell host.
//!
//! # Responsibility
//! - Define the host settings consumed by the engine layer.
//! - Load the optional JSON config file and the environment overrides.
//!
//! # Invariants
//! - The network-disable flag is plain data owned by the config; nothing in
//!   the core reads process globals for it.
//! - Layering order is defaults, then config file, then environment, then
//!   command-line flags (applied by the shell binary).

use crate::boot::BOOT_PATH_VAR;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when no explicit path is
/// given.
pub const DEFAULT_CONFIG_FILE: &str = "jshell.json";

/// Host settings assembled before the engine starts.
///
/// Command-line script arguments never come from the config file; the shell
/// binary fills them in after loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HostConfig {
    /// Disables network-dependent script features for this process.
    #[serde(default)]
    pub no_network: bool,
    /// Overrides boot script location discovery.
    #[serde(default)]
    pub boot_path: Option<PathBuf>,
    /// Logfile path; the default name in the working directory when unset.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// Log level; the build-mode default when unset.
    #[serde(default)]
    pub log_level: Option<String>,
    /// Arguments exposed to the script as its argument array.
    #[serde(skip)]
    pub script_args: Vec<String>,
}

impl HostConfig {
    /// Fills unset fields from the process environment.
    ///
    /// Currently only the boot path override variable is consulted, and only
    /// when no boot path was configured explicitly.
    pub fn apply_env(&mut self) {
        if self.boot_path.is_none() {
            if let Ok(value) = std::env::var(BOOT_PATH_VAR) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    self.boot_path = Some(PathBuf::from(trimmed));
                }
            }
        }
    }

    /// Returns the logfile path to use, falling back to the default name.
    pub fn effective_log_file(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::logging::LOG_FILE_NAME))
    }

    /// Returns the log level to use, falling back to the build-mode default.
    pub fn effective_log_level(&self) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| crate::logging::default_log_level().to_string())
    }
}

/// Loads host settings from a JSON config file.
///
/// # Errors
/// - Returns `ConfigError::Read` when the file cannot be read.
/// - Returns `ConfigError::Parse` when the contents are not valid config
///   JSON.
pub fn load_config_file(path: impl AsRef<Path>) -> Result<HostConfig, ConfigError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Config loading errors.
#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => {
                write!(f, "cannot read config file `{}`: {source}", path.display())
            }
            Self::Parse { path, source } => {
                write!(f, "invalid config file `{}`: {source}", path.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
        }
    }
}
