//! Interval algebra over inclusive calendar-day ranges.
//!
//! Every range here is closed on both ends: a range from the 5th to the 5th
//! covers one day, and two ranges that touch on a boundary day overlap. All
//! functions read the bounds through [`Interval::bounds`], which orders them,
//! so an inverted range behaves like its normalized counterpart.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::{is_weekend, HolidaySet};

/// A calendar-day span with optional descriptive metadata.
///
/// Also used for blackout periods, where `label` names the period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            label: None,
            kind: None,
        }
    }

    pub fn labeled(start: NaiveDate, end: NaiveDate, label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new(start, end)
        }
    }

    /// True when `start > end`.
    pub fn is_inverted(&self) -> bool {
        self.start > self.end
    }

    /// Iterate every day of the range in ascending order.
    pub fn days(&self) -> Days {
        let (start, end) = self.bounds();
        days_between(start, end)
    }
}

/// A blackout period is a labeled range supplied by the host application.
pub type BlackoutPeriod = DateRange;

/// A previously committed booking, used for conflict detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingEvent {
    pub id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ExistingEvent {
    pub fn new(id: impl Into<String>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            title: None,
        }
    }

    pub fn to_range(&self) -> DateRange {
        DateRange {
            start: self.start,
            end: self.end,
            label: self.title.clone(),
            kind: None,
        }
    }
}

/// Anything with an inclusive pair of calendar-day bounds.
pub trait Interval {
    fn start(&self) -> NaiveDate;
    fn end(&self) -> NaiveDate;

    /// `(min, max)` of the two bounds.
    fn bounds(&self) -> (NaiveDate, NaiveDate) {
        let (a, b) = (self.start(), self.end());
        (a.min(b), a.max(b))
    }
}

impl Interval for DateRange {
    fn start(&self) -> NaiveDate {
        self.start
    }
    fn end(&self) -> NaiveDate {
        self.end
    }
}

impl Interval for ExistingEvent {
    fn start(&self) -> NaiveDate {
        self.start
    }
    fn end(&self) -> NaiveDate {
        self.end
    }
}

impl Interval for (NaiveDate, NaiveDate) {
    fn start(&self) -> NaiveDate {
        self.0
    }
    fn end(&self) -> NaiveDate {
        self.1
    }
}

/// True iff the two closed intervals share at least one day.
///
/// Boundary touches count (`a.start == b.end` overlaps), and so does full
/// containment in either direction. Symmetric in its arguments.
pub fn overlaps<A: Interval + ?Sized, B: Interval + ?Sized>(a: &A, b: &B) -> bool {
    let (a_start, a_end) = a.bounds();
    let (b_start, b_end) = b.bounds();
    a_start <= b_end && b_start <= a_end
}

/// True iff every day of `inner` lies within `outer`.
pub fn contains<A: Interval + ?Sized, B: Interval + ?Sized>(outer: &A, inner: &B) -> bool {
    let (outer_start, outer_end) = outer.bounds();
    let (inner_start, inner_end) = inner.bounds();
    outer_start <= inner_start && inner_end <= outer_end
}

/// The candidates that overlap `range`, in their original order.
pub fn find_overlaps<'a, R, C>(range: &R, candidates: &'a [C]) -> Vec<&'a C>
where
    R: Interval + ?Sized,
    C: Interval,
{
    candidates.iter().filter(|c| overlaps(range, *c)).collect()
}

/// Inclusive count of calendar days between two dates, in either order.
///
/// A same-day range is one day long.
pub fn duration_calendar_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days().abs() + 1
}

/// Days in `[min(start, end), max(start, end)]` that are neither weekend days
/// nor holidays.
pub fn duration_business_days(start: NaiveDate, end: NaiveDate, holidays: &[NaiveDate]) -> i64 {
    let set = HolidaySet::from_dates(holidays);
    count_business_days(start, end, &set)
}

/// Business-day count against an already-built holiday set.
pub(crate) fn count_business_days(start: NaiveDate, end: NaiveDate, holidays: &HolidaySet) -> i64 {
    days_between(start.min(end), start.max(end))
        .filter(|day| !is_weekend(*day) && !holidays.contains(*day))
        .count() as i64
}

/// Iterator over every day in an inclusive range. See [`DateRange::days`].
#[derive(Debug, Clone)]
pub struct Days {
    next: Option<NaiveDate>,
    last: NaiveDate,
}

impl Iterator for Days {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = if current < self.last {
            current.checked_add_signed(Duration::days(1))
        } else {
            None
        };
        Some(current)
    }
}

/// Days from `start` to `end` inclusive. Empty when `start > end`.
pub(crate) fn days_between(start: NaiveDate, end: NaiveDate) -> Days {
    Days {
        next: (start <= end).then_some(start),
        last: end,
    }
}
