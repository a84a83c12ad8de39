//! Configuration Management for DisplayHAL Core.
//!
//! ## Key Components:
//!
//! - [`types`]: the schema, [`CoreConfig`] and [`LoggingConfig`].
//! - [`defaults`]: default values referenced by the `serde` attributes.
//! - [`loader`]: [`ConfigLoader`], which locates, parses and validates the file.
//! - [`properties`]: the [`PropertyProvider`] trait and [`PropertyMap`], the
//!   string-keyed settings read by the compositor helpers.
//!
//! ## Configuration Loading Process:
//!
//! 1. `ConfigLoader::load()` resolves the path from `$DISPLAYHAL_CONFIG` or falls
//!    back to `/etc/displayhal/config.toml`.
//! 2. A missing file yields `CoreConfig::default()`.
//! 3. The TOML text is parsed into `CoreConfig`; the `[properties]` table is
//!    flattened into dotted keys on the way in.
//! 4. The result is validated (log level and format are normalized to lowercase).

pub mod defaults;
pub mod loader;
pub mod properties;
pub mod types;

pub use loader::ConfigLoader;
pub use properties::{PropertyMap, PropertyProvider};
pub use types::{CoreConfig, LoggingConfig};
