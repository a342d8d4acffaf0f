//! Core checker trait and error types.

use std::time::Duration;

use thiserror::Error;

use crate::config::{ConfigError, ConfigView};

/// Errors that can occur while initializing or running a check.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Configuration is missing or invalid.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// The check ran but observed a failure.
    #[error("check failed: {0}")]
    Failed(String),
}

/// A named, config-aware unit of recurring work.
///
/// The lifecycle manager calls these methods in a fixed order: `name` (to
/// derive the checker's configuration sub-view), `init` (once at startup and
/// again on every configuration reload), then `check` repeatedly, forever,
/// once per `interval`.
///
/// `interval` is read before every sleep, so an `init` that rewrites the
/// interval retunes the cadence without restarting the timer loop.
///
/// # Init/Check concurrency
///
/// `init` takes `&self` because a reload re-initializes checkers whose timer
/// loops are already running; the core does not stop, restart, or synchronize
/// those loops. A checker that mutates internal state in `init` while `check`
/// may be mid-flight owns its locking discipline (see the concrete checkers
/// in [`crate::checks`] for the interior-mutex pattern).
#[async_trait::async_trait]
pub trait Checker: Send + Sync + 'static {
    /// Unique name, also the key of this checker's configuration section.
    fn name(&self) -> &str;

    /// Delay between the end of one `check` call and the start of the next.
    fn interval(&self) -> Duration;

    /// Initialize from this checker's configuration sub-view.
    ///
    /// Called once before `run_all` and again on every configuration reload.
    /// A missing section yields an empty view, not an error; the checker
    /// decides which keys are required.
    fn init(&self, config: ConfigView) -> Result<(), CheckError>;

    /// Perform one check cycle.
    ///
    /// Errors are logged by the timer loop and never escalated; the check is
    /// simply retried on its next tick.
    async fn check(&self) -> Result<(), CheckError>;
}
