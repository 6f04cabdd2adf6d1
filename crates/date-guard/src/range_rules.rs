//! Range rule engine, built on the single-date rules.
//!
//! Order of evaluation, each step short-circuiting the rest:
//!
//! 1. presence and format of both endpoints
//! 2. ordering (`start > end` is reported on both keys)
//! 3. the single-date rules on each endpoint
//! 4. duration bounds
//! 5. holidays inside the span
//! 6. blackout periods overlapping the span
//! 7. conflicts with existing events
//! 8. quota
//!
//! An inverted range is always reported as `StartAfterEnd`, whatever else is
//! wrong with its endpoints. Range-level failures (steps 4-8) are recorded on
//! the end key.

use chrono::NaiveDate;
use serde_json::json;

use crate::blackout::{find_conflicting_events, find_conflicting_ranges, is_range_in_blackout};
use crate::calendar::HolidaySet;
use crate::date_rules::{plural_days, RuleResult};
use crate::error::{ErrorKind, Result, ValidationError};
use crate::input::{format_date, DateInput};
use crate::options::ValidationOptions;
use crate::range::{count_business_days, duration_calendar_days, DateRange};
use crate::session::ValidationSession;

impl ValidationSession {
    /// Validate a `[start, end]` request, recording endpoint problems under
    /// their own keys and range problems under `end_key`.
    ///
    /// Once ordering passes, the context receives `total_days_count` and
    /// `business_days_count` for the span; the quota step additionally sets
    /// `remaining_days`, on success and on failure alike.
    ///
    /// # Errors
    /// `GuardError::InvalidOptions` when `options` fail
    /// [`ValidationOptions::check`].
    pub fn validate_date_range(
        &mut self,
        start: impl Into<DateInput>,
        end: impl Into<DateInput>,
        start_key: &str,
        end_key: &str,
        options: &ValidationOptions,
    ) -> Result<bool> {
        options.check()?;
        let today = self.today();
        let holidays = HolidaySet::from_dates(&options.holidays);

        let start = self.normalize_input(&start.into(), options.required);
        let end = self.normalize_input(&end.into(), options.required);
        let (start, end) = match (start, end) {
            (Ok(Some(start)), Ok(Some(end))) => (start, end),
            (Ok(start), Ok(end)) => {
                // An optional endpoint is empty: there is no span to check.
                let start_outcome =
                    start.map_or(Ok(()), |d| self.check_date_rules(d, options, today, &holidays));
                let end_outcome =
                    end.map_or(Ok(()), |d| self.check_date_rules(d, options, today, &holidays));
                let start_ok = self.record(start_key, start_outcome);
                let end_ok = self.record(end_key, end_outcome);
                return Ok(start_ok && end_ok);
            }
            (start, end) => {
                // Both endpoints are reported, not just the first failure.
                let start_ok = self.record(start_key, start.map(|_| ()));
                let end_ok = self.record(end_key, end.map(|_| ()));
                return Ok(start_ok && end_ok);
            }
        };

        if start > end {
            let details = json!({ "start": start, "end": end });
            self.reject(
                end_key,
                ValidationError::new(
                    ErrorKind::StartAfterEnd,
                    "The end date must be on or after the start date",
                )
                .with_details(details.clone()),
            );
            return Ok(self.reject(
                start_key,
                ValidationError::new(
                    ErrorKind::StartAfterEnd,
                    "The start date must be on or before the end date",
                )
                .with_details(details),
            ));
        }

        let start_outcome = self.check_date_rules(start, options, today, &holidays);
        let end_outcome = self.check_date_rules(end, options, today, &holidays);
        let start_ok = self.record(start_key, start_outcome);
        let end_ok = self.record(end_key, end_outcome);
        if !(start_ok && end_ok) {
            return Ok(false);
        }

        let total = duration_calendar_days(start, end);
        let business = count_business_days(start, end, &holidays);
        self.context.total_days_count = Some(total);
        self.context.business_days_count = Some(business);

        let outcome = self.check_span(start, end, total, business, options, &holidays);
        Ok(self.record(end_key, outcome))
    }

    /// Report `range` as a conflict if it overlaps any of `existing`.
    pub fn validate_overlap(
        &mut self,
        range: &DateRange,
        existing: &[DateRange],
        field_key: &str,
    ) -> bool {
        let overlapping = find_conflicting_ranges(range, existing);
        if overlapping.is_empty() {
            return self.accept(field_key);
        }
        let message = format!(
            "This period overlaps {} existing period{}",
            overlapping.len(),
            if overlapping.len() == 1 { "" } else { "s" }
        );
        let error = ValidationError::new(ErrorKind::Conflict, message)
            .with_details(json!({ "overlapping": overlapping }));
        self.reject(field_key, error)
    }

    fn record(&mut self, field_key: &str, outcome: RuleResult<()>) -> bool {
        match outcome {
            Ok(()) => self.accept(field_key),
            Err(error) => self.reject(field_key, error),
        }
    }

    /// Steps 4-8. Mutates the context for conflicts and quota.
    fn check_span(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        total: i64,
        business: i64,
        options: &ValidationOptions,
        holidays: &HolidaySet,
    ) -> RuleResult<()> {
        if let Some(min) = options.min_duration {
            if total < min {
                return Err(ValidationError::new(
                    ErrorKind::MinDuration,
                    format!("The period must last at least {}", plural_days(min)),
                )
                .with_details(json!({ "min": min, "actual": total })));
            }
        }
        if let Some(max) = options.max_duration {
            if total > max {
                return Err(ValidationError::new(
                    ErrorKind::MaxDuration,
                    format!("The period cannot last more than {}", plural_days(max)),
                )
                .with_details(json!({ "max": max, "actual": total })));
            }
        }

        let span = DateRange::new(start, end);

        if !holidays.is_empty() {
            let inside: Vec<NaiveDate> = span.days().filter(|d| holidays.contains(*d)).collect();
            if let Some(first) = inside.first() {
                return Err(ValidationError::new(
                    ErrorKind::Holiday,
                    format!("The period includes a public holiday ({})", format_date(*first, None)),
                )
                .with_details(json!({ "holidays": inside })));
            }
        }

        let blackout = is_range_in_blackout(&span, &options.blackout_periods);
        if blackout.in_blackout {
            let labels: Vec<&str> = blackout
                .affected_periods
                .iter()
                .filter_map(|p| p.label.as_deref())
                .collect();
            let message = if labels.is_empty() {
                "The period overlaps a blackout period".to_string()
            } else {
                format!("The period overlaps a blackout period ({})", labels.join(", "))
            };
            return Err(ValidationError::new(ErrorKind::BlackoutPeriod, message)
                .with_details(json!({ "affected_periods": blackout.affected_periods })));
        }

        let conflicts = find_conflicting_events(
            &span,
            &options.existing_events,
            options.event_id_to_ignore.as_deref(),
        );
        self.context.conflicts = conflicts.iter().map(|e| e.to_range()).collect();
        if !conflicts.is_empty() {
            let message = match conflicts[0].title.as_deref() {
                Some(title) if conflicts.len() == 1 => {
                    format!("The period conflicts with \"{title}\"")
                }
                _ => format!("The period conflicts with {} existing event(s)", conflicts.len()),
            };
            return Err(ValidationError::new(ErrorKind::Conflict, message)
                .with_details(json!({ "conflicts": conflicts })));
        }

        if let (Some(available), Some(used)) = (options.available_days_per_year, self.context.used_days) {
            let charged = if options.business_days_only { business } else { total };
            let remaining = available - used - charged;
            self.context.remaining_days = Some(remaining);
            self.context.available_days_per_year = Some(available);
            if remaining < 0 {
                let left = available - used;
                return Err(ValidationError::new(
                    ErrorKind::ExceedsAvailableDays,
                    format!(
                        "This request exceeds your available days ({} remaining)",
                        plural_days(left)
                    ),
                )
                .with_details(json!({
                    "requested": charged,
                    "available": left,
                    "total": available,
                })));
            }
        }

        Ok(())
    }
}
