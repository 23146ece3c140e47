//! Wall-clock abstraction used to timestamp session events.
//!
//! Phase pacing never reads this clock; timers run on the Tokio time driver.

use std::sync::Arc;

use chrono::{DateTime, Utc};

/// Abstraction over system time so journals are reproducible in tests.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Shared handle to a clock, as injected into the engine.
pub type SharedClock = Arc<dyn Clock>;

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
