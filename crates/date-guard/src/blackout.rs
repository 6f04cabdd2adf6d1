//! Blackout-period membership and conflict lookup against existing events.
//!
//! Unlike timed-slot conflict detection, ranges here are whole calendar days
//! and inclusive on both ends: an event ending on the 5th conflicts with a
//! request starting on the 5th.

use chrono::NaiveDate;
use serde::Serialize;

use crate::range::{overlaps, BlackoutPeriod, DateRange, ExistingEvent, Interval};

/// Result of checking a range against blackout periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlackoutCheck<'a> {
    pub in_blackout: bool,
    /// Every period overlapping the range, in input order.
    pub affected_periods: Vec<&'a BlackoutPeriod>,
}

/// True if `date` falls within any period, bounds included.
pub fn is_date_in_blackout(date: NaiveDate, periods: &[BlackoutPeriod]) -> bool {
    blackout_containing(date, periods).is_some()
}

/// The first period containing `date`, bounds included.
pub fn blackout_containing(date: NaiveDate, periods: &[BlackoutPeriod]) -> Option<&BlackoutPeriod> {
    periods.iter().find(|period| {
        let (start, end) = period.bounds();
        start <= date && date <= end
    })
}

/// Collect every blackout period overlapping `range`.
pub fn is_range_in_blackout<'a, R>(range: &R, periods: &'a [BlackoutPeriod]) -> BlackoutCheck<'a>
where
    R: Interval + ?Sized,
{
    let affected_periods: Vec<&BlackoutPeriod> =
        periods.iter().filter(|period| overlaps(range, *period)).collect();

    BlackoutCheck {
        in_blackout: !affected_periods.is_empty(),
        affected_periods,
    }
}

/// Find the events overlapping `range`, skipping the one whose id equals
/// `ignore_id` (the record being edited).
pub fn find_conflicting_events<'a, R>(
    range: &R,
    events: &'a [ExistingEvent],
    ignore_id: Option<&str>,
) -> Vec<&'a ExistingEvent>
where
    R: Interval + ?Sized,
{
    events
        .iter()
        .filter(|event| ignore_id != Some(event.id.as_str()))
        .filter(|event| overlaps(range, *event))
        .collect()
}

/// Convenience for callers that only hold plain ranges (e.g. a list of
/// existing bookings without ids).
pub fn find_conflicting_ranges<'a, R>(range: &R, existing: &'a [DateRange]) -> Vec<&'a DateRange>
where
    R: Interval + ?Sized,
{
    crate::range::find_overlaps(range, existing)
}
