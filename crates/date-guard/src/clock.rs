//! Sources of "today".
//!
//! Rule evaluation reads the clock once per call and compares calendar days,
//! so the time of day never leaks into past/future decisions.

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

pub trait Clock {
    /// The current calendar day.
    fn today(&self) -> NaiveDate;
}

/// Wall clock, read in a fixed IANA timezone.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    pub timezone: Tz,
}

impl SystemClock {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.timezone).date_naive()
    }
}

/// A clock frozen on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}
