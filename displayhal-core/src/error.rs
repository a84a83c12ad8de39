//! Error handling for the DisplayHAL core layer.
//!
//! The main error type for this crate is [`CoreError`], which wraps the more
//! specific [`ConfigError`] and [`LoggingError`]. Higher crates define their own
//! error enums and only reach for `CoreError` when they load configuration or
//! set up logging.
//!
//! # Examples
//!
//! ```rust,ignore
//! use displayhal_core::error::{ConfigError, CoreError};
//!
//! fn check_level(level: &str) -> Result<(), CoreError> {
//!     if level.is_empty() {
//!         return Err(ConfigError::ValidationError("empty log level".to_string()).into());
//!     }
//!     Ok(())
//! }
//! ```

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for DisplayHAL.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Errors related to configuration loading, parsing, or validation.
    #[error("Configuration Error: {0}")]
    Config(#[from] ConfigError),

    /// Errors raised while installing the global `tracing` subscriber.
    #[error("Logging Error: {0}")]
    Logging(#[from] LoggingError),

    /// Filesystem failures that are not tied to a configuration file,
    /// e.g. creating the directory of a log file.
    #[error("Filesystem Error: {message} (Path: {path:?})")]
    Filesystem {
        message: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Error type for configuration-related operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file from {path:?}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The configuration file is not valid TOML or does not match the schema.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Parsing succeeded but a value is out of range.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Error type for logging initialization.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The configured level is not one of trace, debug, info, warn, error.
    #[error("Invalid log level: '{0}'")]
    InvalidLevel(String),

    /// A global subscriber was already installed, or installing it failed.
    #[error("Failed to initialize logging: {0}")]
    InitializationFailure(String),
}
