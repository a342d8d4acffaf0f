//! checkd - Recurring-Check Scheduler
//!
//! This crate runs an arbitrary set of user-supplied check functions on
//! independent timers, forever, and exposes their results as named
//! gauges/counters over a pull-based `/metrics` endpoint.
//!
//! # Architecture
//!
//! - **Scheduler**: one repeating timer loop per registered check closure
//! - **Checker lifecycle**: named, config-aware checkers with an explicit
//!   init phase, re-initialized on configuration reload
//! - **Metric registry**: idempotent get-or-create of prometheus handles by
//!   name, safe under concurrent check loops
//! - **Exposition server**: axum `/metrics` endpoint in prometheus text
//!   format
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//!
//! use checkd::{MetricRegistry, Scheduler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let metrics = MetricRegistry::new();
//!     let scheduler = Scheduler::new();
//!
//!     let registry = metrics.clone();
//!     scheduler.every(Duration::from_secs(60), move || {
//!         registry
//!             .counter("check_calls_total", "Number of check invocations")
//!             .inc();
//!     });
//!
//!     // Runs all checks, then serves /metrics forever.
//!     scheduler.start(metrics, "0.0.0.0:8666".parse()?).await?;
//!     Ok(())
//! }
//! ```

pub mod check;
pub mod checks;
pub mod config;
pub mod metrics;
pub mod server;

pub use check::{CheckError, Checker, InitError, LifecycleManager, Scheduler};
pub use config::{AppConfig, ConfigError, ConfigView};
pub use metrics::MetricRegistry;
pub use server::{AppState, ServeError};
