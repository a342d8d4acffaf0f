//! Metrics module.
//!
//! - [`MetricRegistry`]: idempotent, name-keyed store of prometheus handles

mod registry;

pub use registry::MetricRegistry;
