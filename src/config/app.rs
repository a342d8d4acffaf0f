//! Application configuration structures.

use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::validation::ConfigError;
use super::view::ConfigView;

/// Default metrics listener port.
pub const DEFAULT_PORT: u16 = 8666;

/// Metrics listener configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener bind address (default: "0.0.0.0").
    pub bind: String,

    /// Listener port (default: 8666).
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Top-level application configuration.
///
/// Checker configuration is deliberately free-form: each checker owns the
/// section keyed by its name under `checks` and decides which keys it needs
/// at init time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Metrics listener configuration.
    #[serde(default)]
    pub server: ServerConfig,

    /// Per-checker configuration sections, keyed by checker name.
    #[serde(default)]
    pub checks: serde_yaml::Mapping,
}

impl AppConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if any field is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;

        if self.server.port == 0 {
            return Err(ConfigError::ValidationError(
                "server port must be non-zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Socket address of the metrics listener.
    ///
    /// # Errors
    /// Returns `ConfigError::ValidationError` if the bind address is invalid.
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip = self.server.bind.parse::<IpAddr>().map_err(|_| {
            ConfigError::ValidationError(format!(
                "invalid server bind address: '{}'",
                self.server.bind
            ))
        })?;
        Ok(SocketAddr::new(ip, self.server.port))
    }

    /// The configuration sub-view for the checker named `name`.
    ///
    /// A missing or non-mapping section yields an empty view; the checker's
    /// init hook decides whether absent keys are an error.
    pub fn section(&self, name: &str) -> ConfigView {
        match self.checks.get(name) {
            Some(serde_yaml::Value::Mapping(section)) => ConfigView::from_mapping(section.clone()),
            _ => ConfigView::default(),
        }
    }
}
