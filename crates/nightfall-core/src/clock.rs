//! Clock abstraction for determinism.

use chrono::{DateTime, Utc};

/// Abstraction over wall-clock time.
///
/// Deadlines of timed steps and votes are computed and checked against this
/// clock, so tests can drive time explicitly.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Whole seconds left until `deadline`, rounded up, never negative.
    fn seconds_until(&self, deadline: DateTime<Utc>) -> u64 {
        let millis = (deadline - self.now()).num_milliseconds();
        if millis <= 0 {
            0
        } else {
            u64::try_from(millis).map_or(u64::MAX, |m| m.div_ceil(1000))
        }
    }
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
