//! Idempotent metric registry.
//!
//! Checks look their metrics up by name on every invocation; the registry
//! hands back the existing handle instead of erroring on repeat lookups, so
//! concurrent increments from different check loops compose on the same
//! underlying value.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{Counter, Encoder, Gauge, GaugeVec, Opts, Registry, TextEncoder};

/// Name-keyed, type-segregated store of gauge/counter/gauge-vector handles
/// backed by a private [`prometheus::Registry`].
///
/// Cloning is cheap and every clone shares the same underlying state, so a
/// single registry can be handed to the scheduler, each checker, and the
/// exposition endpoint. Handles live for the process lifetime; there is no
/// eviction.
///
/// Using the same name for two different metric kinds is a contract violation
/// and is not guarded against.
#[derive(Clone, Default)]
pub struct MetricRegistry {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    registry: Registry,
    gauges: Mutex<HashMap<String, Gauge>>,
    counters: Mutex<HashMap<String, Counter>>,
    gauge_vecs: Mutex<HashMap<String, GaugeVec>>,
}

impl MetricRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the gauge registered under `name`.
    ///
    /// The first call for a given name creates the gauge and registers it with
    /// the exposition layer; later calls return the existing handle and ignore
    /// `help` (first registration wins). The lookup-or-create sequence holds
    /// the map lock for its full duration, so concurrent first calls cannot
    /// double-register.
    ///
    /// # Panics
    ///
    /// Panics if `name` is not a valid metric name, or on a duplicate
    /// registration at the prometheus level. Both indicate two code paths
    /// disagreeing about a metric's identity and are treated as fatal
    /// programmer errors rather than recoverable conditions.
    pub fn gauge(&self, name: &str, help: &str) -> Gauge {
        let mut gauges = self.inner.gauges.lock();
        if let Some(gauge) = gauges.get(name) {
            return gauge.clone();
        }
        let gauge = Gauge::with_opts(Opts::new(name, help))
            .unwrap_or_else(|e| panic!("invalid gauge {name:?}: {e}"));
        self.register(name, gauge.clone());
        gauges.insert(name.to_string(), gauge.clone());
        gauge
    }

    /// Get or create the counter registered under `name`.
    ///
    /// Same contract as [`gauge`](Self::gauge), counter kind.
    ///
    /// # Panics
    ///
    /// Same fatal conditions as [`gauge`](Self::gauge).
    pub fn counter(&self, name: &str, help: &str) -> Counter {
        let mut counters = self.inner.counters.lock();
        if let Some(counter) = counters.get(name) {
            return counter.clone();
        }
        let counter = Counter::with_opts(Opts::new(name, help))
            .unwrap_or_else(|e| panic!("invalid counter {name:?}: {e}"));
        self.register(name, counter.clone());
        counters.insert(name.to_string(), counter.clone());
        counter
    }

    /// Get or create the gauge vector registered under `name`.
    ///
    /// Same contract as [`gauge`](Self::gauge). The label set is fixed at
    /// first creation and is part of the handle's identity; callers must not
    /// vary `labels` for a given name on later calls.
    ///
    /// # Panics
    ///
    /// Same fatal conditions as [`gauge`](Self::gauge).
    pub fn gauge_vec(&self, name: &str, help: &str, labels: &[&str]) -> GaugeVec {
        let mut gauge_vecs = self.inner.gauge_vecs.lock();
        if let Some(vec) = gauge_vecs.get(name) {
            return vec.clone();
        }
        let vec = GaugeVec::new(Opts::new(name, help), labels)
            .unwrap_or_else(|e| panic!("invalid gauge vector {name:?}: {e}"));
        self.register(name, vec.clone());
        gauge_vecs.insert(name.to_string(), vec.clone());
        vec
    }

    /// Gather the current values of every registered metric.
    pub fn gather(&self) -> Vec<MetricFamily> {
        self.inner.registry.gather()
    }

    /// Encode all registered metrics in the prometheus text exposition format.
    pub fn encode_text(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    fn register(&self, name: &str, collector: impl Collector + 'static) {
        // Reached only on a map miss, so a registry-level failure means some
        // other code path registered this name behind our back.
        self.inner
            .registry
            .register(Box::new(collector))
            .unwrap_or_else(|e| panic!("duplicate registration for metric {name:?}: {e}"));
    }
}

impl std::fmt::Debug for MetricRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricRegistry")
            .field("gauges", &self.inner.gauges.lock().len())
            .field("counters", &self.inner.counters.lock().len())
            .field("gauge_vecs", &self.inner.gauge_vecs.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gauge_cached() {
        let registry = MetricRegistry::new();
        let first = registry.gauge("test_set_gauge", "first help");
        registry.gauge("test_set_gauge", "different help").set(1.0);

        // Same underlying gauge, exactly one registered family.
        assert_eq!(first.get(), 1.0);
        assert_eq!(registry.gather().len(), 1);

        // First registration wins, including the help text.
        let text = registry.encode_text().unwrap();
        assert!(text.contains("# HELP test_set_gauge first help"));
        assert!(!text.contains("different help"));
    }

    #[test]
    fn test_counter_shared_across_lookups() {
        let registry = MetricRegistry::new();
        registry.counter("test_counter", "").inc();
        registry.counter("test_counter", "").inc();

        assert_eq!(registry.gather().len(), 1);
        assert_eq!(registry.counter("test_counter", "").get(), 2.0);
    }

    #[test]
    fn test_gauge_vec_cached() {
        let registry = MetricRegistry::new();
        let first = registry.gauge_vec("test_vec", "", &["target"]);
        let second = registry.gauge_vec("test_vec", "", &["target"]);
        second.with_label_values(&["foo"]).set(1.0);

        assert_eq!(registry.gather().len(), 1);
        assert_eq!(first.with_label_values(&["foo"]).get(), 1.0);
    }

    #[test]
    fn test_distinct_names_distinct_handles() {
        let registry = MetricRegistry::new();
        registry.gauge("gauge_a", "").set(1.0);
        registry.gauge("gauge_b", "").set(2.0);
        assert_eq!(registry.gather().len(), 2);
    }

    #[test]
    fn test_concurrent_first_creation_registers_once() {
        let registry = MetricRegistry::new();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let registry = registry.clone();
            handles.push(std::thread::spawn(move || {
                for _ in 0..100 {
                    registry.counter("test_racy_counter", "").inc();
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.gather().len(), 1);
        assert_eq!(registry.counter("test_racy_counter", "").get(), 800.0);
    }

    #[test]
    fn test_encode_text() {
        let registry = MetricRegistry::new();
        registry.gauge("test_encoded_gauge", "a gauge").set(42.0);

        let text = registry.encode_text().unwrap();
        assert!(text.contains("# HELP test_encoded_gauge a gauge"));
        assert!(text.contains("test_encoded_gauge 42"));
    }

    #[test]
    fn test_isolated_registries() {
        let a = MetricRegistry::new();
        let b = MetricRegistry::new();
        a.gauge("test_isolated", "");
        assert_eq!(a.gather().len(), 1);
        assert!(b.gather().is_empty());
    }
}
