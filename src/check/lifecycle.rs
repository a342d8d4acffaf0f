//! Init/run orchestration for named checkers.

use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::check::traits::{CheckError, Checker};
use crate::config::AppConfig;

/// A checker's init hook failed during a lifecycle pass.
#[derive(Debug, Error)]
#[error("{name}: {source}")]
pub struct InitError {
    /// Name of the failing checker.
    pub name: String,
    /// The underlying init failure.
    #[source]
    pub source: CheckError,
}

/// Orchestrates the two-phase checker lifecycle: a configuration-scoped init
/// pass over every registered checker, then one repeating timer loop per
/// checker.
///
/// [`init_all`] may be called again on every configuration reload. Re-init
/// does not stop or restart timer loops that are already running; it only
/// invokes each checker's own init hook, which decides what to mutate and is
/// responsible for its own locking against concurrent `check` calls (see
/// [`Checker`]).
///
/// [`run_all`] is intended to be called exactly once per process; there is no
/// guard against a second call, which would launch duplicate loops.
///
/// [`init_all`]: LifecycleManager::init_all
/// [`run_all`]: LifecycleManager::run_all
#[derive(Default)]
pub struct LifecycleManager {
    checkers: Mutex<Vec<Arc<dyn Checker>>>,
    shutdown: CancellationToken,
}

impl LifecycleManager {
    /// Create a manager with no registered checkers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a checker to the list of checkers that will be run.
    ///
    /// The list is append-only; registering the same checker twice appends a
    /// duplicate entry.
    pub fn register(&self, checker: Arc<dyn Checker>) {
        tracing::info!(checker = %checker.name(), "registering checker");
        self.checkers.lock().push(checker);
    }

    /// Number of registered checkers.
    pub fn checker_count(&self) -> usize {
        self.checkers.lock().len()
    }

    /// Initialize every registered checker, in registration order.
    ///
    /// Each checker receives the configuration sub-view keyed by its own
    /// name. The pass aborts on the first failure: checkers after the failing
    /// one are not initialized, and the error carries the failing checker's
    /// name.
    ///
    /// Safe to call again on a configuration change while checkers are
    /// running; the running loops are left untouched.
    pub fn init_all(&self, config: &AppConfig) -> Result<(), InitError> {
        let checkers = self.checkers.lock().clone();
        tracing::info!(count = checkers.len(), "initializing registered checkers");
        for checker in &checkers {
            tracing::info!(checker = %checker.name(), "initializing");
            checker
                .init(config.section(checker.name()))
                .map_err(|source| InitError {
                    name: checker.name().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    /// Launch one independent timer loop per registered checker.
    ///
    /// Each loop invokes `check`, logs any error, re-reads the checker's
    /// interval, sleeps, and repeats until process exit (or [`shutdown`] in
    /// tests). A failing check is retried on its next natural tick with no
    /// backoff; errors never propagate beyond the loop. A panicking check
    /// body aborts the whole process (fail-fast), same as [`Scheduler`].
    ///
    /// [`Scheduler`]: crate::check::Scheduler
    /// [`shutdown`]: LifecycleManager::shutdown
    pub fn run_all(&self) {
        let checkers = self.checkers.lock().clone();
        tracing::info!(count = checkers.len(), "running checkers");
        for checker in checkers {
            let shutdown = self.shutdown.clone();
            tokio::spawn(async move {
                loop {
                    let outcome = std::panic::AssertUnwindSafe(checker.check())
                        .catch_unwind()
                        .await;
                    match outcome {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            tracing::error!(checker = %checker.name(), error = %e, "check failed");
                        }
                        Err(_) => {
                            tracing::error!(checker = %checker.name(), "check panicked, aborting process");
                            std::process::abort();
                        }
                    }
                    // Re-read each tick: a reload's init may retune the
                    // interval without restarting this loop.
                    let interval = checker.interval();
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
            });
        }
    }

    /// Stop all running timer loops. Test harness use only.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigView;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct RecordingChecker {
        name: &'static str,
        interval: Mutex<Duration>,
        init_calls: AtomicUsize,
        check_calls: AtomicUsize,
        fail_init: bool,
    }

    impl RecordingChecker {
        fn new(name: &'static str, interval: Duration) -> Arc<Self> {
            Arc::new(Self {
                name,
                interval: Mutex::new(interval),
                init_calls: AtomicUsize::new(0),
                check_calls: AtomicUsize::new(0),
                fail_init: false,
            })
        }

        fn failing(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                interval: Mutex::new(Duration::from_secs(1)),
                init_calls: AtomicUsize::new(0),
                check_calls: AtomicUsize::new(0),
                fail_init: true,
            })
        }
    }

    #[async_trait::async_trait]
    impl Checker for RecordingChecker {
        fn name(&self) -> &str {
            self.name
        }

        fn interval(&self) -> Duration {
            *self.interval.lock()
        }

        fn init(&self, config: ConfigView) -> Result<(), CheckError> {
            self.init_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_init {
                return Err(CheckError::Failed("boom".to_string()));
            }
            if let Some(interval) = config.duration_value("interval")? {
                *self.interval.lock() = interval;
            }
            Ok(())
        }

        async fn check(&self) -> Result<(), CheckError> {
            self.check_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn config_with(yaml: &str) -> AppConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_init_all_aborts_on_first_failure() {
        let manager = LifecycleManager::new();
        let failing = RecordingChecker::failing("broken");
        let after = RecordingChecker::new("after", Duration::from_secs(1));
        manager.register(Arc::clone(&failing) as Arc<dyn Checker>);
        manager.register(Arc::clone(&after) as Arc<dyn Checker>);

        let err = manager.init_all(&AppConfig::default()).unwrap_err();
        assert_eq!(err.name, "broken");
        assert!(err.to_string().starts_with("broken: "));
        assert_eq!(failing.init_calls.load(Ordering::SeqCst), 1);
        assert_eq!(after.init_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_init_all_scopes_config_by_name() {
        let manager = LifecycleManager::new();
        let checker = RecordingChecker::new("tuned", Duration::from_secs(1));
        manager.register(Arc::clone(&checker) as Arc<dyn Checker>);

        let config = config_with("checks:\n  tuned:\n    interval: 5s\n");
        manager.init_all(&config).unwrap();
        assert_eq!(checker.interval(), Duration::from_secs(5));
    }

    #[test]
    fn test_init_all_is_rerunnable() {
        let manager = LifecycleManager::new();
        let checker = RecordingChecker::new("steady", Duration::from_secs(1));
        manager.register(Arc::clone(&checker) as Arc<dyn Checker>);

        let config = AppConfig::default();
        manager.init_all(&config).unwrap();
        manager.init_all(&config).unwrap();
        assert_eq!(checker.init_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_all_ticks_checkers_independently() {
        let manager = LifecycleManager::new();
        let fast = RecordingChecker::new("fast", Duration::from_millis(2));
        let slow = RecordingChecker::new("slow", Duration::from_millis(6));
        manager.register(Arc::clone(&fast) as Arc<dyn Checker>);
        manager.register(Arc::clone(&slow) as Arc<dyn Checker>);

        manager.run_all();

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(fast.check_calls.load(Ordering::SeqCst) >= 2);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(slow.check_calls.load(Ordering::SeqCst) >= 2);

        manager.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_retunes_interval_without_restart() {
        let manager = LifecycleManager::new();
        let checker = RecordingChecker::new("tuned", Duration::from_millis(100));
        manager.register(Arc::clone(&checker) as Arc<dyn Checker>);

        manager.init_all(&AppConfig::default()).unwrap();
        manager.run_all();

        // One immediate invocation, then a long sleep.
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(checker.check_calls.load(Ordering::SeqCst), 1);

        // A reload shortens the interval; the running loop picks it up on
        // its next tick.
        let config = config_with("checks:\n  tuned:\n    interval: 5ms\n");
        manager.init_all(&config).unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(checker.check_calls.load(Ordering::SeqCst) >= 10);

        manager.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn test_failing_check_is_retried_next_tick() {
        struct AlwaysFails {
            check_calls: AtomicUsize,
        }

        #[async_trait::async_trait]
        impl Checker for AlwaysFails {
            fn name(&self) -> &str {
                "always_fails"
            }

            fn interval(&self) -> Duration {
                Duration::from_millis(2)
            }

            fn init(&self, _config: ConfigView) -> Result<(), CheckError> {
                Ok(())
            }

            async fn check(&self) -> Result<(), CheckError> {
                self.check_calls.fetch_add(1, Ordering::SeqCst);
                Err(CheckError::Failed("always".to_string()))
            }
        }

        let manager = LifecycleManager::new();
        let checker = Arc::new(AlwaysFails {
            check_calls: AtomicUsize::new(0),
        });
        manager.register(Arc::clone(&checker) as Arc<dyn Checker>);
        manager.run_all();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(checker.check_calls.load(Ordering::SeqCst) >= 3);

        manager.shutdown();
    }
}
