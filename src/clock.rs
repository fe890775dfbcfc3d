/// Wall clock abstraction so the sweeper and sync can run against a fixed time in tests
use std::cell::Cell;

use chrono::{DateTime, SecondsFormat};

pub trait Clock {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;
}

/// Reads `Date.now()` from the JS host
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        js_sys::Date::now() as i64
    }
}

/// Settable clock for tests
#[derive(Debug, Default)]
pub struct FixedClock {
    now: Cell<i64>,
}

impl FixedClock {
    pub fn new(now_ms: i64) -> Self {
        FixedClock { now: Cell::new(now_ms) }
    }

    pub fn set(&self, now_ms: i64) {
        self.now.set(now_ms);
    }

    pub fn advance_minutes(&self, minutes: i64) {
        self.now.set(self.now.get() + minutes * MINUTE_MS);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}

pub const MINUTE_MS: i64 = 60 * 1000;

/// Format epoch milliseconds the way `Date.prototype.toISOString` does
pub fn iso_timestamp(epoch_ms: i64) -> String {
    DateTime::from_timestamp_millis(epoch_ms)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}
