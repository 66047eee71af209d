//! Wall-clock access.
//!
//! Reward days and login stamps depend on the server's local calendar, so the
//! clock is injected rather than read ad hoc. Tests pin it with [`FixedClock`].

use std::sync::Mutex;

use chrono::{DateTime, Duration, Local, NaiveDate};

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Local>;

    /// Local calendar day of [`Clock::now`].
    fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }
}

/// The operating system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Local>>,
}

impl FixedClock {
    pub const fn new(now: DateTime<Local>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Local>) {
        *self.now.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut guard = self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = *guard + by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Local> {
        *self
            .now
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Storage form of a calendar day (`YYYY-MM-DD`).
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Storage form of a timestamp (`YYYY-MM-DD HH:MM:SS`, local time).
pub fn timestamp_key(at: DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn noon(y: i32, m: u32, d: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(y, m, d, 12, 0, 0).single().unwrap()
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(noon(2026, 6, 14));
        assert_eq!(day_key(clock.today()), "2026-06-14");
        clock.advance(Duration::days(1));
        assert_eq!(day_key(clock.today()), "2026-06-15");
    }

    #[test]
    fn timestamp_format() {
        assert_eq!(timestamp_key(noon(2026, 6, 14)), "2026-06-14 12:00:00");
    }
}
