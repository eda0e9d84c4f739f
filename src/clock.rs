use chrono::{DateTime, FixedOffset, Local};

/// Source of the evaluation instant. Statistics windows ("last ten
/// minutes", "today") are always measured against `now()` at query time.
pub trait Clock: Send + Sync {
    /// Current instant, carrying the local UTC offset used for calendar-day
    /// and hour-of-day bucketing.
    fn now(&self) -> DateTime<FixedOffset>;
}

/// Wall clock in the server's local time zone.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().fixed_offset()
    }
}
