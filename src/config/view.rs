//! Per-checker configuration sub-views.

use std::time::Duration;

use serde_yaml::Mapping;

use super::validation::{ConfigError, parse_duration};

/// A checker-scoped view of the configuration.
///
/// Each checker reads its settings from the section keyed by its own name;
/// the view exposes typed getters over that section's key-value pairs. An
/// empty view (missing section) returns `None` for every key.
#[derive(Debug, Clone, Default)]
pub struct ConfigView {
    values: Mapping,
}

impl ConfigView {
    /// Build a view over a YAML mapping.
    pub fn from_mapping(values: Mapping) -> Self {
        Self { values }
    }

    /// Parse a view from a YAML string. Mostly useful in tests.
    ///
    /// # Errors
    /// Returns `ConfigError::ParseError` if the string is not a YAML mapping.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let values: Mapping = serde_yaml::from_str(yaml)?;
        Ok(Self::from_mapping(values))
    }

    /// Whether this view has no keys at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// String value for `key`, if present and a string.
    pub fn str_value(&self, key: &str) -> Option<&str> {
        self.values.get(key)?.as_str()
    }

    /// Unsigned integer value for `key`.
    pub fn u64_value(&self, key: &str) -> Option<u64> {
        self.values.get(key)?.as_u64()
    }

    /// Float value for `key`.
    pub fn f64_value(&self, key: &str) -> Option<f64> {
        self.values.get(key)?.as_f64()
    }

    /// Boolean value for `key`.
    pub fn bool_value(&self, key: &str) -> Option<bool> {
        self.values.get(key)?.as_bool()
    }

    /// Duration value for `key`, parsed from a humantime string like `30s`
    /// or `24h`.
    ///
    /// An absent key is `Ok(None)`; a present but unparsable value is an
    /// error so a checker's init can surface the misconfiguration.
    pub fn duration_value(&self, key: &str) -> Result<Option<Duration>, ConfigError> {
        match self.str_value(key) {
            None => Ok(None),
            Some(s) => parse_duration(s)
                .map(Some)
                .map_err(|e| ConfigError::ValidationError(format!("{key}: {e}"))),
        }
    }
}
