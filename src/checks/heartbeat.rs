//! Heartbeat checker.

use std::time::Duration;

use parking_lot::Mutex;

use crate::check::{CheckError, Checker};
use crate::config::ConfigView;
use crate::metrics::MetricRegistry;

/// Default collection interval (1 minute).
const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Increments the `check_heartbeats_total` counter on every tick.
///
/// Useful as a liveness signal for the scheduler itself: a stalled counter
/// on the scrape side means check loops are no longer running.
pub struct HeartbeatChecker {
    metrics: MetricRegistry,
    interval: Mutex<Duration>,
}

impl HeartbeatChecker {
    /// Create a heartbeat checker reporting into `metrics`.
    pub fn new(metrics: MetricRegistry) -> Self {
        Self {
            metrics,
            interval: Mutex::new(DEFAULT_INTERVAL),
        }
    }
}

#[async_trait::async_trait]
impl Checker for HeartbeatChecker {
    fn name(&self) -> &str {
        "heartbeat"
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
        self.metrics
            .counter(
                "check_heartbeats_total",
                "Number of times the heartbeat checker has run",
            )
            .inc();
        Ok(())
    }
}
