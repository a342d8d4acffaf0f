//! Configuration module.
//!
//! Provides YAML-based configuration loading and validation for:
//! - Server settings (bind address, exposition port)
//! - Per-checker configuration sections, keyed by checker name

mod app;
mod validation;
mod view;

pub use app::{AppConfig, ServerConfig};
pub use validation::{ConfigError, parse_duration};
pub use view::ConfigView;

// Re-export constants
pub use app::DEFAULT_PORT;
