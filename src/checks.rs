//! Built-in checkers.
//!
//! - [`ClockChecker`]: reports the current Unix time as a gauge
//! - [`HeartbeatChecker`]: counts its own invocations

mod clock;
mod heartbeat;

pub use clock::ClockChecker;
pub use heartbeat::HeartbeatChecker;
