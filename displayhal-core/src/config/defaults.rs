//! Default configuration values for DisplayHAL Core.
//!
//! These functions are used by `serde`'s `default` attribute in the configuration
//! structures when a value is not present in the file.

use crate::config::LoggingConfig;
use std::path::PathBuf;

/// Environment variable that overrides the configuration file location.
pub const CONFIG_PATH_ENV: &str = "DISPLAYHAL_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is not set.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/displayhal/config.toml";

/// Returns the default `LoggingConfig`, used when the `[logging]` section is missing.
pub(crate) fn default_logging_config() -> LoggingConfig {
    LoggingConfig {
        level: default_log_level(),
        file_path: default_log_file_path(),
        format: default_log_format(),
    }
}

/// Returns the default log level string (`"info"`).
pub(crate) fn default_log_level() -> String {
    "info".to_string()
}

/// No log file by default.
pub(crate) fn default_log_file_path() -> Option<PathBuf> {
    None
}

/// Returns the default log format string (`"text"`).
pub(crate) fn default_log_format() -> String {
    "text".to_string()
}
