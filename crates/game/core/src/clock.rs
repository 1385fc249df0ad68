//! Monotonic time source.
//!
//! The engine never reads wall-clock time. Every deadline is compared
//! against an injected [`Clock`], so tests drive time explicitly.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::state::Timestamp;

/// Monotonic millisecond clock shared by every agent of an arena.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Clock advanced explicitly by its owner (frame loop or test).
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Timestamp::ZERO)
    }

    pub fn starting_at(start: Timestamp) -> Self {
        Self {
            millis: AtomicU64::new(start.as_millis()),
        }
    }

    /// Advances by `ms` and returns the new time.
    pub fn advance(&self, ms: u64) -> Timestamp {
        Timestamp(self.millis.fetch_add(ms, Ordering::Relaxed) + ms)
    }

    /// Moves the clock to `at` if it is later than the current time.
    pub fn advance_to(&self, at: Timestamp) -> Timestamp {
        let previous = self.millis.fetch_max(at.as_millis(), Ordering::Relaxed);
        Timestamp(previous.max(at.as_millis()))
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.millis.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_never_runs_backwards() {
        let clock = ManualClock::new();
        assert_eq!(clock.advance(250), Timestamp(250));
        assert_eq!(clock.advance_to(Timestamp(100)), Timestamp(250));
        assert_eq!(clock.advance_to(Timestamp(900)), Timestamp(900));
        assert_eq!(clock.now(), Timestamp(900));
    }
}
