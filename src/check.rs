//! Check scheduling and lifecycle.
//!
//! - [`Scheduler`]: runs opaque check closures on independent timers
//! - [`Checker`]: named, config-aware check with an explicit init phase
//! - [`LifecycleManager`]: init/run orchestration for [`Checker`]s

mod lifecycle;
mod scheduler;
mod traits;

pub use lifecycle::{InitError, LifecycleManager};
pub use scheduler::{CheckSpec, Scheduler};
pub use traits::{CheckError, Checker};
