//! Test clocks: deterministic `Clock` implementations for tests.

use chrono::{DateTime, TimeDelta, Utc};
use nightfall_core::clock::Clock;

/// A clock that always returns a fixed point in time.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// A clock that follows tokio's time source.
///
/// Under `#[tokio::test(start_paused = true)]` tokio time auto-advances
/// whenever every task is idle, so a whole timed game runs in virtual time
/// while deadlines still line up with the session's sleeps.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    origin: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl TokioClock {
    /// Creates a clock reading `origin` at the current tokio instant.
    #[must_use]
    pub fn new(origin: DateTime<Utc>) -> Self {
        Self {
            origin,
            started: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.started.elapsed()).unwrap_or_default();
        self.origin + elapsed
    }
}
