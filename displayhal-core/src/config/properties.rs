//! System property access.
//!
//! The compositor helpers consult a handful of string-keyed settings
//! (`debug.sf.hw`, `debug.composition.type`, ...). They read them through the
//! [`PropertyProvider`] trait so tests and embedders can supply their own source;
//! [`PropertyMap`] is the in-memory implementation filled from the `[properties]`
//! table of the configuration file.

use crate::error::ConfigError;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use toml::Value;

/// Read access to string-keyed system properties.
///
/// An absent key is a valid state; callers decide what it means.
pub trait PropertyProvider: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Returns the value stored under `key`, or `default` when it is absent.
    fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_string())
    }
}

/// In-memory property store with dotted keys.
///
/// # Examples
///
/// ```
/// use displayhal_core::config::{PropertyMap, PropertyProvider};
///
/// let mut props = PropertyMap::new();
/// props.set("debug.sf.hw", "1");
/// assert_eq!(props.get("debug.sf.hw").as_deref(), Some("1"));
/// assert_eq!(props.get_or("debug.composition.type", "gpu"), "gpu");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyMap {
    values: BTreeMap<String, String>,
}

impl PropertyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.remove(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Builds a map from a TOML table.
    ///
    /// Nested tables are flattened into dotted keys, so `debug.sf.hw = "1"` and
    /// `"debug.sf.hw" = "1"` are equivalent. Scalars are stored in their textual
    /// form; arrays have no property representation and are rejected.
    pub fn from_table(table: &toml::Table) -> Result<Self, ConfigError> {
        let mut map = Self::new();
        Self::flatten_into(&mut map, None, table)?;
        Ok(map)
    }

    fn flatten_into(
        map: &mut Self,
        prefix: Option<&str>,
        table: &toml::Table,
    ) -> Result<(), ConfigError> {
        for (key, value) in table {
            let full_key = match prefix {
                Some(prefix) => format!("{prefix}.{key}"),
                None => key.clone(),
            };
            let text = match value {
                Value::Table(nested) => {
                    Self::flatten_into(map, Some(&full_key), nested)?;
                    continue;
                }
                Value::String(s) => s.clone(),
                Value::Integer(i) => i.to_string(),
                Value::Float(f) => f.to_string(),
                Value::Boolean(b) => b.to_string(),
                Value::Datetime(d) => d.to_string(),
                Value::Array(_) => {
                    return Err(ConfigError::ValidationError(format!(
                        "Property '{full_key}' is an array; properties must be scalar values."
                    )));
                }
            };
            map.values.insert(full_key, text);
        }
        Ok(())
    }
}

impl PropertyProvider for PropertyMap {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertyMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.set(key, value);
        }
        map
    }
}

impl<'de> Deserialize<'de> for PropertyMap {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let table = toml::Table::deserialize(deserializer)?;
        PropertyMap::from_table(&table).map_err(serde::de::Error::custom)
    }
}
