//! Calendar predicates: weekends, holidays, business days.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate, Weekday};

/// Saturday or Sunday.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Exact calendar-day match against any entry in `holidays`.
pub fn is_holiday(date: NaiveDate, holidays: &[NaiveDate]) -> bool {
    holidays.contains(&date)
}

/// Neither a weekend day nor a holiday.
pub fn is_business_day(date: NaiveDate, holidays: &[NaiveDate]) -> bool {
    !is_weekend(date) && !is_holiday(date, holidays)
}

/// Hash-backed holiday lookup, built once per validation call so that
/// day-by-day scans stay linear in the range length.
#[derive(Debug, Clone, Default)]
pub struct HolidaySet {
    days: HashSet<NaiveDate>,
}

impl HolidaySet {
    pub fn from_dates(holidays: &[NaiveDate]) -> Self {
        Self {
            days: holidays.iter().copied().collect(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.days.contains(&date)
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        !is_weekend(date) && !self.contains(date)
    }
}
