//! Recurring leave requests: an RRULE expanded into whole-day occurrences,
//! each checked against quota, blackout periods and existing events.
//!
//! Expansion wraps the `rrule` crate. Occurrences are calendar days, so the
//! rule is anchored at midnight UTC and only the date part of each instance
//! is kept.

use chrono::{Duration, NaiveDate, Utc};
use rrule::RRuleSet;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::blackout::{find_conflicting_events, is_range_in_blackout};
use crate::calendar::HolidaySet;
use crate::config::RecurringDefaults;
use crate::date_rules::plural_days;
use crate::error::{ErrorKind, GuardError, Result, ValidationError};
use crate::input::{DateInput, Normalized};
use crate::leave::{self, LeaveValidator};
use crate::options::ValidationOptions;
use crate::range::{count_business_days, duration_calendar_days, DateRange, ExistingEvent};

/// Upper bound on instances pulled from an unbounded rule. `max_occurrences`
/// must stay below it so an overflow can still be detected.
pub const EXPANSION_CAP: u16 = 500;

/// An RFC 5545 recurrence rule plus the length of each occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    /// e.g. `FREQ=WEEKLY;BYDAY=MO`
    pub rrule: String,
    /// Days covered by each occurrence, at least 1.
    #[serde(default = "one_day")]
    pub occurrence_days: u32,
}

fn one_day() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurringOptions {
    #[serde(flatten)]
    pub base: ValidationOptions,
    /// Must be below [`EXPANSION_CAP`].
    pub max_occurrences: usize,
    /// How far past today the pattern may extend, in years. 0 disables.
    pub max_generation_years: u32,
    /// Check every occurrence for conflicts and blackout periods.
    pub validate_all_occurrences: bool,
}

impl Default for RecurringOptions {
    fn default() -> Self {
        Self::from_defaults(ValidationOptions::default(), &RecurringDefaults::default())
    }
}

impl RecurringOptions {
    pub fn from_defaults(base: ValidationOptions, defaults: &RecurringDefaults) -> Self {
        Self {
            base,
            max_occurrences: defaults.max_occurrences,
            max_generation_years: defaults.max_generation_years,
            validate_all_occurrences: true,
        }
    }

    /// Reject options the engine cannot honor.
    ///
    /// # Errors
    /// `GuardError::InvalidOptions` when the base options are contradictory or
    /// `max_occurrences` is not below [`EXPANSION_CAP`].
    pub fn check(&self) -> Result<()> {
        self.base.check()?;
        check_occurrence_limit(self.max_occurrences)
    }
}

pub(crate) fn check_occurrence_limit(limit: usize) -> Result<()> {
    if limit >= usize::from(EXPANSION_CAP) {
        return Err(GuardError::InvalidOptions(format!(
            "max_occurrences must be below {}, got {}",
            EXPANSION_CAP, limit
        )));
    }
    Ok(())
}

/// One occurrence that hit existing events or blackout periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OccurrenceConflict {
    pub occurrence: DateRange,
    pub events: Vec<ExistingEvent>,
    pub blackout_periods: Vec<DateRange>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecurringReport {
    pub valid: bool,
    pub occurrences: Vec<DateRange>,
    /// Days charged across all occurrences (business days when
    /// `business_days_only`).
    pub total_days: i64,
    pub conflicts: Vec<OccurrenceConflict>,
}

pub fn recurring_start_key(user_id: &str) -> String {
    format!("recurring_leave_start_{user_id}")
}

pub fn recurring_end_key(user_id: &str) -> String {
    format!("recurring_leave_end_{user_id}")
}

pub fn pattern_key(user_id: &str) -> String {
    format!("recurring_pattern_{user_id}")
}

/// Expand `pattern` into occurrences starting within `[from, until]`.
///
/// Returns at most `limit` occurrences; the flag is true when the rule would
/// have produced more.
///
/// # Errors
/// Returns `GuardError::InvalidRule` if the rule is empty or unparseable, or
/// if `occurrence_days` is zero or pushes an occurrence past the last
/// representable date. Returns `GuardError::InvalidOptions` if `limit` is not
/// below [`EXPANSION_CAP`].
pub fn expand_occurrences(
    pattern: &RecurrencePattern,
    from: NaiveDate,
    until: NaiveDate,
    limit: usize,
) -> Result<(Vec<DateRange>, bool)> {
    let rule = pattern.rrule.trim();
    if rule.is_empty() {
        return Err(GuardError::InvalidRule("empty RRULE string".to_string()));
    }
    if pattern.occurrence_days == 0 {
        return Err(GuardError::InvalidRule(
            "occurrence_days must be at least 1".to_string(),
        ));
    }
    check_occurrence_limit(limit)?;

    let upper = rule.to_uppercase();
    let mut rrule_str = rule.to_string();
    // RFC 5545 forbids COUNT and UNTIL together; with COUNT the window is
    // applied after expansion instead.
    if !upper.contains("UNTIL=") && !upper.contains("COUNT=") {
        rrule_str = format!("{};UNTIL={}T235959Z", rrule_str, until.format("%Y%m%d"));
    }
    let rrule_text = format!(
        "DTSTART;TZID=UTC:{}T000000\nRRULE:{}",
        from.format("%Y%m%d"),
        rrule_str
    );

    let rrule_set: RRuleSet = rrule_text
        .parse()
        .map_err(|e| GuardError::InvalidRule(format!("{}", e)))?;

    // limit < EXPANSION_CAP, so one extra instance always fits.
    let fetch = u16::try_from(limit + 1).unwrap_or(EXPANSION_CAP);
    let span = Duration::days(i64::from(pattern.occurrence_days) - 1);

    let mut occurrences = rrule_set
        .all(fetch)
        .dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .filter(|day| *day >= from && *day <= until)
        .map(|day| {
            day.checked_add_signed(span)
                .map(|end| DateRange::new(day, end))
                .ok_or_else(|| {
                    GuardError::InvalidRule(format!(
                        "occurrence_days {} runs past the last supported date",
                        pattern.occurrence_days
                    ))
                })
        })
        .collect::<Result<Vec<DateRange>>>()?;

    let limited = occurrences.len() > limit;
    occurrences.truncate(limit);
    Ok((occurrences, limited))
}

impl LeaveValidator {
    /// Validate a recurring leave request whose occurrences start between
    /// `pattern_start` and `pattern_end`.
    ///
    /// The window itself is validated as a leave request first (presence,
    /// ordering, past dates, notice...); its errors are mirrored onto the
    /// `recurring_leave_*` keys. Pattern-level failures land on
    /// `recurring_pattern_{user}`, quota and horizon failures on
    /// `recurring_leave_end_{user}`.
    ///
    /// # Errors
    /// `GuardError::InvalidOptions` for malformed options, a
    /// `max_generation_years` too large to add to today or a
    /// `max_occurrences` at or above [`EXPANSION_CAP`].
    /// `GuardError::InvalidRule` for an unusable pattern.
    pub fn validate_recurring_leave_request(
        &mut self,
        pattern_start: impl Into<DateInput>,
        pattern_end: impl Into<DateInput>,
        user_id: &str,
        pattern: &RecurrencePattern,
        options: &RecurringOptions,
    ) -> Result<RecurringReport> {
        options.check()?;
        let start_key = recurring_start_key(user_id);
        let end_key = recurring_end_key(user_id);
        let rule_key = pattern_key(user_id);
        for key in [&start_key, &end_key, &rule_key] {
            self.session_mut().clear_error(key);
        }

        let mut report = RecurringReport {
            valid: false,
            occurrences: Vec::new(),
            total_days: 0,
            conflicts: Vec::new(),
        };

        // Span-wide rules would judge the gaps between occurrences too, so
        // the window only gets the per-date rules.
        let window_options = ValidationOptions {
            holidays: Vec::new(),
            min_duration: None,
            max_duration: None,
            blackout_periods: Vec::new(),
            existing_events: Vec::new(),
            available_days_per_year: None,
            ..options.base.clone()
        };
        let (pattern_start, pattern_end) = (pattern_start.into(), pattern_end.into());
        let window_ok = self.validate_leave_request(
            pattern_start.clone(),
            pattern_end.clone(),
            user_id,
            &window_options,
        )?;
        if !window_ok {
            self.mirror(&leave::start_key(user_id), &start_key);
            self.mirror(&leave::end_key(user_id), &end_key);
            return Ok(report);
        }

        let tz = self.session().timezone();
        let (from, until) = match (pattern_start.normalize(tz), pattern_end.normalize(tz)) {
            (Normalized::Date(from), Normalized::Date(until)) => (from, until),
            // The window already passed presence and format checks.
            _ => return Ok(report),
        };

        if options.max_generation_years > 0 {
            let horizon = self
                .session()
                .today()
                .checked_add_signed(Duration::days(365 * i64::from(options.max_generation_years)))
                .ok_or_else(|| {
                    GuardError::InvalidOptions(format!(
                        "max_generation_years {} runs past the last supported date",
                        options.max_generation_years
                    ))
                })?;
            if until > horizon {
                self.session_mut().set_error(
                    &end_key,
                    ValidationError::new(
                        ErrorKind::MaxAdvanceBooking,
                        format!(
                            "A recurring request cannot extend more than {} year(s) ahead",
                            options.max_generation_years
                        ),
                    )
                    .with_details(json!({ "horizon": horizon })),
                );
                return Ok(report);
            }
        }

        let (occurrences, limited) =
            expand_occurrences(pattern, from, until, options.max_occurrences)?;
        if limited {
            self.session_mut().set_error(
                &rule_key,
                ValidationError::new(
                    ErrorKind::Other,
                    format!(
                        "This pattern produces more than {} occurrences",
                        options.max_occurrences
                    ),
                )
                .with_details(json!({ "max_occurrences": options.max_occurrences })),
            );
            report.occurrences = occurrences;
            return Ok(report);
        }
        if occurrences.is_empty() {
            self.session_mut().set_error(
                &rule_key,
                ValidationError::new(ErrorKind::Other, "This pattern produces no occurrences"),
            );
            return Ok(report);
        }

        let holidays = HolidaySet::from_dates(&options.base.holidays);
        report.total_days = occurrences
            .iter()
            .map(|o| {
                if options.base.business_days_only {
                    count_business_days(o.start, o.end, &holidays)
                } else {
                    duration_calendar_days(o.start, o.end)
                }
            })
            .sum();
        self.session_mut().context_mut().total_days_count = Some(report.total_days);
        report.occurrences = occurrences;

        if let Some(available) = options.base.available_days_per_year {
            self.load_used_days(user_id);
            let used = self.session().context().used_days.unwrap_or(0);
            let left = available - used;
            self.session_mut().context_mut().remaining_days = Some(left - report.total_days);
            if report.total_days > left {
                self.session_mut().set_error(
                    &end_key,
                    ValidationError::new(
                        ErrorKind::ExceedsAvailableDays,
                        format!(
                            "The occurrences total {} but only {} remain",
                            plural_days(report.total_days),
                            plural_days(left)
                        ),
                    )
                    .with_details(json!({
                        "requested": report.total_days,
                        "available": left,
                        "total": available,
                    })),
                );
                return Ok(report);
            }
        }

        if options.validate_all_occurrences {
            report.conflicts = occurrence_conflicts(&report.occurrences, &options.base);
            if !report.conflicts.is_empty() {
                self.session_mut().set_error(
                    &rule_key,
                    ValidationError::new(
                        ErrorKind::Conflict,
                        format!(
                            "{} occurrence(s) conflict with existing events or blackout periods",
                            report.conflicts.len()
                        ),
                    )
                    .with_details(json!({ "conflicting_occurrences": report.conflicts })),
                );
                return Ok(report);
            }
        }

        report.valid = true;
        Ok(report)
    }

    fn mirror(&mut self, from_key: &str, to_key: &str) {
        if let Some(error) = self.session().get_error(from_key).cloned() {
            self.session_mut().set_error(to_key, error);
        }
    }
}

fn occurrence_conflicts(
    occurrences: &[DateRange],
    options: &ValidationOptions,
) -> Vec<OccurrenceConflict> {
    occurrences
        .iter()
        .filter_map(|occurrence| {
            let events: Vec<ExistingEvent> = find_conflicting_events(
                occurrence,
                &options.existing_events,
                options.event_id_to_ignore.as_deref(),
            )
            .into_iter()
            .cloned()
            .collect();
            let blackout_periods: Vec<DateRange> =
                is_range_in_blackout(occurrence, &options.blackout_periods)
                    .affected_periods
                    .into_iter()
                    .cloned()
                    .collect();
            if events.is_empty() && blackout_periods.is_empty() {
                None
            } else {
                Some(OccurrenceConflict {
                    occurrence: occurrence.clone(),
                    events,
                    blackout_periods,
                })
            }
        })
        .collect()
}
