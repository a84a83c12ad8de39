//! Configuration Data Structures for DisplayHAL Core.
//!
//! These structs are populated by deserializing the TOML configuration file.
//! Missing fields take their values from [`super::defaults`]; unknown fields are
//! rejected through `#[serde(deny_unknown_fields)]`.

use super::defaults;
use super::properties::PropertyMap;
use serde::Deserialize;
use std::path::PathBuf;

/// Configuration settings for the logging subsystem.
///
/// # Examples
///
/// ```
/// use displayhal_core::config::LoggingConfig;
/// use std::path::PathBuf;
///
/// let default_log_config = LoggingConfig::default();
/// assert_eq!(default_log_config.level, "info");
/// assert_eq!(default_log_config.file_path, None);
/// assert_eq!(default_log_config.format, "text");
///
/// let toml_str = r#"
/// level = "debug"
/// file_path = "/var/log/displayhal.log"
/// format = "json"
/// "#;
/// let log_config: LoggingConfig = toml::from_str(toml_str).unwrap();
/// assert_eq!(log_config.level, "debug");
/// assert_eq!(log_config.file_path, Some(PathBuf::from("/var/log/displayhal.log")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Minimum level to record: "trace", "debug", "info", "warn" or "error".
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    /// Optional log file. File logging is disabled when `None`.
    #[serde(default = "defaults::default_log_file_path")]
    pub file_path: Option<PathBuf>,
    /// "text" or "json".
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        defaults::default_logging_config()
    }
}

/// Root configuration structure.
///
/// ```
/// use displayhal_core::config::{CoreConfig, PropertyProvider};
///
/// let toml_str = r#"
/// [logging]
/// level = "warn"
///
/// [properties]
/// "debug.sf.hw" = 1
/// "#;
/// let config: CoreConfig = toml::from_str(toml_str).unwrap();
/// assert_eq!(config.logging.level, "warn");
/// assert_eq!(config.properties.get("debug.sf.hw").as_deref(), Some("1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    #[serde(default = "defaults::default_logging_config")]
    pub logging: LoggingConfig,
    /// System-property style settings, flattened to dotted keys.
    #[serde(default)]
    pub properties: PropertyMap,
}

impl CoreConfig {
    /// Returns the configured properties.
    pub fn property_map(&self) -> &PropertyMap {
        &self.properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_logging_config_default_values() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert_eq!(config.file_path, None);
        assert_eq!(config.format, "text");
    }

    #[test]
    fn test_core_config_deserialize_empty() {
        let config: CoreConfig = toml::from_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert!(config.properties.is_empty());
    }

    #[test]
    fn test_logging_config_deserialize_partial() {
        let config: LoggingConfig = toml::from_str(r#"level = "debug""#).unwrap();
        assert_eq!(config.level, "debug");
        assert_eq!(config.file_path, None);
        assert_eq!(config.format, "text");
    }

    #[test]
    fn test_logging_config_rejects_unknown_field() {
        let result: Result<LoggingConfig, _> = toml::from_str(
            r#"
            level = "info"
            colour = "always"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_core_config_rejects_unknown_section() {
        let result: Result<CoreConfig, _> = toml::from_str("[compositor]\nvsync = true\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_core_config_rejects_array_property() {
        let result: Result<CoreConfig, _> = toml::from_str(
            r#"
            [properties]
            "debug.sf.hw" = ["1", "0"]
            "#,
        );
        assert!(result.is_err());
    }
}
