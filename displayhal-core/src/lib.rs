//! # DisplayHAL Core Library (`displayhal-core`)
//!
//! `displayhal-core` is the infrastructure layer shared by the DisplayHAL crates.
//! It carries no display logic of its own; it provides:
//!
//! - **Error Handling**: [`CoreError`] and the more specific [`ConfigError`] and
//!   [`LoggingError`].
//! - **Configuration Management**: TOML loading and validation through
//!   [`ConfigLoader`] into a [`CoreConfig`].
//! - **System Properties**: the [`PropertyProvider`] trait and the in-memory
//!   [`PropertyMap`], the string-keyed settings the compositor helpers consult
//!   (e.g. `debug.sf.hw`).
//! - **Logging**: a `tracing` based setup with a console layer and an optional
//!   rolling file layer.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use displayhal_core::config::ConfigLoader;
//! use displayhal_core::logging::init_logging;
//! use displayhal_core::error::CoreError;
//!
//! fn main() -> Result<(), CoreError> {
//!     let core_config = ConfigLoader::load()?;
//!     init_logging(&core_config.logging, false)?;
//!
//!     let properties = core_config.property_map();
//!     tracing::info!(hw = ?properties.get("debug.sf.hw"), "DisplayHAL core initialized.");
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod logging;

// Re-export key types for convenience
pub use config::{ConfigLoader, CoreConfig, LoggingConfig, PropertyMap, PropertyProvider};
pub use error::{ConfigError, CoreError, LoggingError};
pub use logging::{init_logging, init_minimal_logging};
