//! Interval scheduler for opaque check closures.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::metrics::MetricRegistry;
use crate::server::{AppState, ServeError, serve};

type CheckFn = Arc<dyn Fn() + Send + Sync + 'static>;

/// An opaque check function bound to a run interval.
///
/// Immutable once registered; re-registering the same function appends a
/// second spec rather than replacing the first.
#[derive(Clone)]
pub struct CheckSpec {
    work: CheckFn,
    interval: Duration,
}

impl std::fmt::Debug for CheckSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckSpec")
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

/// Runs registered check functions on independent repeating timers.
///
/// Each check gets its own timer loop: invoke, sleep the interval, repeat,
/// with no coordination between checks. The wait is measured from the end of
/// the previous invocation, so a slow check skews its own cadence and nobody
/// else's. Two invocations of the same check never overlap.
///
/// Loops run until process exit in normal operation; [`shutdown`] exists so
/// test harnesses can terminate them deterministically. There is no guard
/// against calling [`start`] twice: doing so launches a second loop for
/// every spec and is a caller error.
///
/// No isolation is provided around check bodies: a panic inside one aborts
/// the whole process (fail-fast). A check either completes and is retried on
/// its next tick, or it takes the process down; there is no silently dead
/// loop in between.
///
/// [`start`]: Scheduler::start
/// [`shutdown`]: Scheduler::shutdown
#[derive(Default)]
pub struct Scheduler {
    specs: Mutex<Vec<CheckSpec>>,
    shutdown: CancellationToken,
}

impl Scheduler {
    /// Create a scheduler with no registered checks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `work` to run at the given interval.
    ///
    /// Appends to the registration list; specs registered after checks have
    /// been spawned are not picked up until the next spawn.
    pub fn every(&self, interval: Duration, work: impl Fn() + Send + Sync + 'static) {
        self.specs.lock().push(CheckSpec {
            work: Arc::new(work),
            interval,
        });
    }

    /// Number of registered check specs.
    pub fn check_count(&self) -> usize {
        self.specs.lock().len()
    }

    /// Launch one independent timer loop per registered spec.
    pub fn spawn_checks(&self) {
        let specs = self.specs.lock().clone();
        tracing::info!(count = specs.len(), "starting checks");
        for spec in specs {
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                loop {
                    // tokio would capture an unwound panic in the discarded
                    // JoinHandle; a panicking check body must be process-fatal
                    // instead.
                    let outcome =
                        std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| (spec.work)()));
                    if outcome.is_err() {
                        tracing::error!("check panicked, aborting process");
                        std::process::abort();
                    }
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(spec.interval) => {}
                    }
                }
            });
        }
    }

    /// Launch all checks, then serve the metrics exposition endpoint.
    ///
    /// This is the terminal call of a host's main control flow: it blocks
    /// forever under normal operation and only returns on a bind or server
    /// error, which callers treat as fatal.
    pub async fn start(&self, metrics: MetricRegistry, addr: SocketAddr) -> Result<(), ServeError> {
        self.spawn_checks();
        serve(addr, AppState { metrics }).await
    }

    /// Stop all running timer loops. Test harness use only; production
    /// schedulers run until process exit.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}
