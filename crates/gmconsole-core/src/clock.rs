//! Clock abstraction for determinism.

use chrono::{DateTime, Utc};

/// Abstraction over system time, injected wherever the session stamps
/// battle-log entries.
pub trait Clock: Send + Sync {
    /// Returns the current time.
    fn now(&self) -> DateTime<Utc>;

    /// Returns the current time as a short stamp (see [`stamp`]).
    fn stamp(&self) -> String {
        stamp(self.now())
    }
}

/// Formats an instant as `HH:MM:SS`, the way battle-log lines show it.
#[must_use]
pub fn stamp(at: DateTime<Utc>) -> String {
    at.format("%H:%M:%S").to_string()
}

/// Production clock that delegates to the system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
