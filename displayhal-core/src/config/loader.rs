//! Configuration Loading for DisplayHAL Core.
//!
//! [`ConfigLoader`] locates the configuration file, deserializes it from TOML
//! and validates the result.
//!
//! ## Configuration File Location
//!
//! `ConfigLoader::load()` reads the path named by `$DISPLAYHAL_CONFIG`, or
//! `/etc/displayhal/config.toml` when the variable is unset. A missing file is
//! not an error: the default configuration is used instead.
//!
//! ## Validation
//!
//! - The log level must be one of "trace", "debug", "info", "warn", "error".
//! - The log format must be "text" or "json".
//! - Both are normalized to lowercase.

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{defaults, CoreConfig};
use crate::error::{ConfigError, CoreError};

/// Namespace for configuration loading.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads and validates the configuration from the default location.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] when the file exists but cannot be read,
    /// parsed or validated.
    pub fn load() -> Result<CoreConfig, CoreError> {
        Self::load_from_path(Self::config_path())
    }

    /// Returns the path `load()` would read.
    pub fn config_path() -> PathBuf {
        env::var_os(defaults::CONFIG_PATH_ENV)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(defaults::DEFAULT_CONFIG_PATH))
    }

    /// Loads and validates the configuration stored at `path`.
    ///
    /// A missing or empty file yields the default configuration.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<CoreConfig, CoreError> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "Loading configuration file.");
                Self::load_from_str(&content)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(
                    path = %path.display(),
                    "Configuration file not found, using defaults."
                );
                Self::load_from_str("")
            }
            Err(e) => Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                source: e,
            }
            .into()),
        }
    }

    /// Parses and validates configuration text.
    pub fn load_from_str(content: &str) -> Result<CoreConfig, CoreError> {
        let mut config: CoreConfig = if content.trim().is_empty() {
            CoreConfig::default()
        } else {
            toml::from_str(content).map_err(ConfigError::ParseError)?
        };
        Self::validate_config(&mut config)?;
        Ok(config)
    }

    /// Normalizes the logging section and rejects unknown levels and formats.
    fn validate_config(config: &mut CoreConfig) -> Result<(), ConfigError> {
        let level_lower = config.logging.level.to_lowercase();
        match level_lower.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {
                config.logging.level = level_lower;
            }
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: '{}'. Must be one of trace, debug, info, warn, error.",
                    config.logging.level
                )));
            }
        }

        let format_lower = config.logging.format.to_lowercase();
        match format_lower.as_str() {
            "text" | "json" => {
                config.logging.format = format_lower;
            }
            _ => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: '{}'. Must be one of text, json.",
                    config.logging.format
                )));
            }
        }

        if let Some(path) = &config.logging.file_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::ValidationError(
                    "logging.file_path must not be empty.".to_string(),
                ));
            }
        }
        Ok(())
    }
}
