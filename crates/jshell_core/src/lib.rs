//! Core embedding layer for the JavaScript shell.
//! This crate owns everything between the shell binary and the engine:
//! logging, configuration, boot path discovery, the native-library registry,
//! binding registration/validation and the builtin script surface.

pub mod boot;
pub mod builtins;
pub mod config;
pub mod host;
pub mod library;
pub mod logging;

pub use boot::{file_exists, resolve_boot_location, BootError};
pub use config::{load_config_file, ConfigError, HostConfig, DEFAULT_CONFIG_FILE};
pub use host::{HostError, ScriptHost, STATUS_OK, STATUS_SCRIPT_ERROR};
pub use library::{LibraryRegistry, LibraryRegistryError};
pub use logging::{
    default_log_level, flush_log, init_logging, logging_status, LOG_FILE_NAME,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
