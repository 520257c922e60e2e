//! Time source used by scheduling.
//!
//! The clock supplies both "now" and the timezone in which weekday and
//! time-of-day are evaluated, so recurrence math can be driven
//! deterministically in tests.

use chrono::{Local, TimeZone, Utc};
use std::cell::Cell;

/// Source of the current instant and the local timezone.
pub trait Clock {
    type Tz: TimeZone;

    /// Timezone used to derive local weekday and time-of-day.
    fn timezone(&self) -> &Self::Tz;

    /// Current instant in Unix epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// Wall clock in the host's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Tz = Local;

    fn timezone(&self) -> &Local {
        &Local
    }

    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for tests and replay drivers.
#[derive(Debug)]
pub struct ManualClock<Tz: TimeZone> {
    tz: Tz,
    now_ms: Cell<i64>,
}

impl<Tz: TimeZone> ManualClock<Tz> {
    pub fn new(tz: Tz, now_ms: i64) -> Self {
        Self {
            tz,
            now_ms: Cell::new(now_ms),
        }
    }

    pub fn set(&self, now_ms: i64) {
        self.now_ms.set(now_ms);
    }

    pub fn advance(&self, delta: chrono::Duration) {
        self.now_ms
            .set(self.now_ms.get().saturating_add(delta.num_milliseconds()));
    }
}

impl<Tz: TimeZone> Clock for ManualClock<Tz> {
    type Tz = Tz;

    fn timezone(&self) -> &Tz {
        &self.tz
    }

    fn now_ms(&self) -> i64 {
        self.now_ms.get()
    }
}

#[cfg(test)]
mod tests {
    use super::{Clock, ManualClock};
    use chrono::{Duration, Utc};

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(Utc, 1_000);
        assert_eq!(clock.now_ms(), 1_000);

        clock.advance(Duration::minutes(1));
        assert_eq!(clock.now_ms(), 61_000);

        clock.set(5);
        assert_eq!(clock.now_ms(), 5);
    }
}
