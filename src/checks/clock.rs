//! Wall-clock checker.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;

use crate::check::{CheckError, Checker};
use crate::config::ConfigView;
use crate::metrics::MetricRegistry;

/// Default collection interval (10 seconds).
const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Reports the current Unix time under the `unix_time_seconds` gauge.
///
/// The interval is read from the `interval` key of the `clock` config
/// section and may be retuned by a reload; it sits behind a mutex because
/// `init` can rewrite it while the timer loop reads it.
pub struct ClockChecker {
    metrics: MetricRegistry,
    interval: Mutex<Duration>,
}

impl ClockChecker {
    /// Create a clock checker reporting into `metrics`.
    pub fn new(metrics: MetricRegistry) -> Self {
        Self {
            metrics,
            interval: Mutex::new(DEFAULT_INTERVAL),
        }
    }
}

#[async_trait::async_trait]
impl Checker for ClockChecker {
    fn name(&self) -> &str {
        "clock"
    }

    fn interval(&self) -> Duration {
        *self.interval.lock()
    }

    fn init(&self, config: ConfigView) -> Result<(), CheckError> {
        if let Some(interval) = config.duration_value("interval")? {
            *self.interval.lock() = interval;
        }
        Ok(())
    }

    async fn check(&self) -> Result<(), CheckError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| CheckError::Failed(format!("system clock before epoch: {e}")))?;
        self.metrics
            .gauge("unix_time_seconds", "Current Unix time")
            .set(now.as_secs_f64());
        Ok(())
    }
}
