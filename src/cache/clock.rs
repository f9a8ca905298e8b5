//! Time sources for cache timestamps

use chrono::{DateTime, TimeZone, Utc};
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

/// Source of the current time, in milliseconds since the Unix epoch
pub trait Clock {
    fn now_millis(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to
///
/// Clones share the same time, so a test can keep one handle and advance the
/// clock seen by a cache that owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Rc<Cell<i64>>,
}

impl ManualClock {
    /// Creates a clock reading `millis` since the epoch
    pub fn at(millis: i64) -> Self {
        Self {
            millis: Rc::new(Cell::new(millis)),
        }
    }

    /// Sets the current time
    pub fn set(&self, millis: i64) {
        self.millis.set(millis);
    }

    /// Moves the clock forward
    pub fn advance(&self, by: Duration) {
        self.millis.set(self.millis.get().saturating_add(duration_millis(by)));
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.millis.get()
    }
}

/// Converts a duration to whole milliseconds, saturating at `i64::MAX`
pub(crate) fn duration_millis(duration: Duration) -> i64 {
    i64::try_from(duration.as_millis()).unwrap_or(i64::MAX)
}

/// Converts epoch milliseconds to a UTC timestamp
pub(crate) fn millis_to_datetime(millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
