//! Tests for recurring leave requests.
//!
//! The session clock is frozen on Monday 2026-03-16, so `plus(7)` is the
//! following Monday.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use chrono_tz::Tz;
use date_guard::error::GuardError;
use date_guard::recurring::{
    expand_occurrences, pattern_key, recurring_end_key, recurring_start_key, EXPANSION_CAP,
};
use date_guard::{
    DateRange, ErrorKind, ExistingEvent, FixedClock, LeaveValidator, RecurrencePattern,
    RecurringOptions, ValidationOptions, ValidationSession,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 16).unwrap()
}

fn plus(days: i64) -> NaiveDate {
    today() + Duration::days(days)
}

fn validator() -> LeaveValidator {
    LeaveValidator::new(ValidationSession::with_clock(FixedClock(today()), Tz::UTC))
}

fn weekly_monday() -> RecurrencePattern {
    RecurrencePattern {
        rrule: "FREQ=WEEKLY;BYDAY=MO".to_string(),
        occurrence_days: 1,
    }
}

// ── Expansion ───────────────────────────────────────────────────────────

#[test]
fn weekly_rule_expands_within_window() {
    let (occurrences, limited) = expand_occurrences(&weekly_monday(), plus(7), plus(34), 50).unwrap();
    assert!(!limited);
    let starts: Vec<NaiveDate> = occurrences.iter().map(|o| o.start).collect();
    assert_eq!(starts, vec![plus(7), plus(14), plus(21), plus(28)]);
    assert!(starts.iter().all(|d| d.weekday() == Weekday::Mon));
}

#[test]
fn multi_day_occurrences_span_inclusive_days() {
    let pattern = RecurrencePattern {
        rrule: "FREQ=WEEKLY;BYDAY=MO".to_string(),
        occurrence_days: 3,
    };
    let (occurrences, _) = expand_occurrences(&pattern, plus(7), plus(14), 50).unwrap();
    assert_eq!(
        occurrences,
        vec![DateRange::new(plus(7), plus(9)), DateRange::new(plus(14), plus(16))]
    );
}

#[test]
fn count_rule_is_respected() {
    let pattern = RecurrencePattern {
        rrule: "FREQ=DAILY;COUNT=3".to_string(),
        occurrence_days: 1,
    };
    let (occurrences, limited) = expand_occurrences(&pattern, plus(1), plus(60), 50).unwrap();
    assert!(!limited);
    assert_eq!(occurrences.len(), 3);
}

#[test]
fn limit_flags_overflow() {
    let pattern = RecurrencePattern {
        rrule: "FREQ=DAILY".to_string(),
        occurrence_days: 1,
    };
    let (occurrences, limited) = expand_occurrences(&pattern, plus(1), plus(100), 10).unwrap();
    assert!(limited);
    assert_eq!(occurrences.len(), 10);
}

#[test]
fn bad_patterns_are_errors() {
    let empty = RecurrencePattern {
        rrule: "  ".to_string(),
        occurrence_days: 1,
    };
    assert!(matches!(
        expand_occurrences(&empty, plus(1), plus(10), 10),
        Err(GuardError::InvalidRule(_))
    ));

    let garbage = RecurrencePattern {
        rrule: "FREQ=SOMETIMES".to_string(),
        occurrence_days: 1,
    };
    assert!(matches!(
        expand_occurrences(&garbage, plus(1), plus(10), 10),
        Err(GuardError::InvalidRule(_))
    ));

    let zero_length = RecurrencePattern {
        occurrence_days: 0,
        ..weekly_monday()
    };
    assert!(expand_occurrences(&zero_length, plus(1), plus(10), 10).is_err());

    let endless = RecurrencePattern {
        occurrence_days: u32::MAX,
        ..weekly_monday()
    };
    assert!(matches!(
        expand_occurrences(&endless, plus(7), plus(14), 10),
        Err(GuardError::InvalidRule(_))
    ));
}

#[test]
fn limit_at_expansion_cap_is_rejected() {
    let daily = RecurrencePattern {
        rrule: "FREQ=DAILY".to_string(),
        occurrence_days: 1,
    };
    let cap = usize::from(EXPANSION_CAP);
    assert!(matches!(
        expand_occurrences(&daily, plus(1), plus(1000), cap),
        Err(GuardError::InvalidOptions(_))
    ));

    let (occurrences, limited) = expand_occurrences(&daily, plus(1), plus(1000), cap - 1).unwrap();
    assert!(limited);
    assert_eq!(occurrences.len(), cap - 1);
}

// ── Validation ──────────────────────────────────────────────────────────

#[test]
fn weekly_request_is_valid() {
    let mut v = validator();
    let report = v
        .validate_recurring_leave_request(plus(7), plus(34), "u", &weekly_monday(), &RecurringOptions::default())
        .unwrap();
    assert!(report.valid);
    assert_eq!(report.occurrences.len(), 4);
    assert_eq!(report.total_days, 4);
    assert!(report.conflicts.is_empty());
    assert_eq!(v.context().total_days_count, Some(4));
    assert!(!v.session().has_any_error());
}

#[test]
fn window_errors_are_mirrored_to_recurring_keys() {
    let mut v = validator();
    let report = v
        .validate_recurring_leave_request(plus(-7), plus(34), "u", &weekly_monday(), &RecurringOptions::default())
        .unwrap();
    assert!(!report.valid);
    assert_eq!(v.get_kind(&recurring_start_key("u")), Some(ErrorKind::PastDate));

    let report = v
        .validate_recurring_leave_request(plus(34), plus(7), "u", &weekly_monday(), &RecurringOptions::default())
        .unwrap();
    assert!(!report.valid);
    assert_eq!(v.get_kind(&recurring_end_key("u")), Some(ErrorKind::StartAfterEnd));
}

#[test]
fn pattern_beyond_generation_horizon_fails() {
    let mut v = validator();
    let report = v
        .validate_recurring_leave_request(
            plus(7),
            plus(365 * 3),
            "u",
            &weekly_monday(),
            &RecurringOptions::default(),
        )
        .unwrap();
    assert!(!report.valid);
    assert_eq!(v.get_kind(&recurring_end_key("u")), Some(ErrorKind::MaxAdvanceBooking));
}

#[test]
fn oversized_generation_horizon_is_an_error() {
    let mut v = validator();
    let options = RecurringOptions {
        max_generation_years: u32::MAX,
        ..RecurringOptions::default()
    };
    let result = v.validate_recurring_leave_request(plus(7), plus(34), "u", &weekly_monday(), &options);
    assert!(matches!(result, Err(GuardError::InvalidOptions(_))));
}

#[test]
fn occurrence_limit_at_cap_is_an_error() {
    let mut v = validator();
    let options = RecurringOptions {
        max_occurrences: usize::from(EXPANSION_CAP),
        ..RecurringOptions::default()
    };
    let result = v.validate_recurring_leave_request(plus(7), plus(34), "u", &weekly_monday(), &options);
    assert!(matches!(result, Err(GuardError::InvalidOptions(_))));
}

#[test]
fn recurring_quota_does_not_carry_over_to_unknown_user() {
    let quota: HashMap<String, i64> = HashMap::from([("u".to_string(), 28)]);
    let mut v = validator().with_quota_source(quota);
    let options = RecurringOptions {
        base: ValidationOptions {
            available_days_per_year: Some(30),
            ..ValidationOptions::default()
        },
        ..RecurringOptions::default()
    };
    let report = v
        .validate_recurring_leave_request(plus(7), plus(34), "u", &weekly_monday(), &options)
        .unwrap();
    assert!(!report.valid);

    let report = v
        .validate_recurring_leave_request(plus(7), plus(34), "ghost", &weekly_monday(), &options)
        .unwrap();
    assert!(report.valid);
    assert_eq!(v.context().used_days, None);
}

#[test]
fn too_many_occurrences_fails_on_pattern_key() {
    let mut v = validator();
    let daily = RecurrencePattern {
        rrule: "FREQ=DAILY".to_string(),
        occurrence_days: 1,
    };
    let report = v
        .validate_recurring_leave_request(plus(1), plus(100), "u", &daily, &RecurringOptions::default())
        .unwrap();
    assert!(!report.valid);
    assert_eq!(v.get_kind(&pattern_key("u")), Some(ErrorKind::Other));
    assert!(v.get_message(&pattern_key("u")).contains("50"));
}

#[test]
fn empty_expansion_fails_on_pattern_key() {
    let mut v = validator();
    let saturdays = RecurrencePattern {
        rrule: "FREQ=WEEKLY;BYDAY=SA".to_string(),
        occurrence_days: 1,
    };
    // Monday to Friday: no Saturday in the window
    let report = v
        .validate_recurring_leave_request(plus(7), plus(11), "u", &saturdays, &RecurringOptions::default())
        .unwrap();
    assert!(!report.valid);
    assert!(report.occurrences.is_empty());
    assert_eq!(v.get_kind(&pattern_key("u")), Some(ErrorKind::Other));
}

#[test]
fn quota_counts_every_occurrence() {
    let quota: HashMap<String, i64> = HashMap::from([("u".to_string(), 28)]);
    let mut v = validator().with_quota_source(quota);
    let options = RecurringOptions {
        base: ValidationOptions {
            available_days_per_year: Some(30),
            ..ValidationOptions::default()
        },
        ..RecurringOptions::default()
    };
    let report = v
        .validate_recurring_leave_request(plus(7), plus(34), "u", &weekly_monday(), &options)
        .unwrap();
    assert!(!report.valid);
    assert_eq!(report.total_days, 4);
    assert_eq!(v.get_kind(&recurring_end_key("u")), Some(ErrorKind::ExceedsAvailableDays));
    assert_eq!(v.context().remaining_days, Some(-2));
}

#[test]
fn conflicting_occurrences_are_listed() {
    let mut v = validator();
    let options = RecurringOptions {
        base: ValidationOptions {
            existing_events: vec![ExistingEvent::new("on-call", plus(14), plus(14))],
            blackout_periods: vec![DateRange::labeled(plus(28), plus(29), "Audit")],
            ..ValidationOptions::default()
        },
        ..RecurringOptions::default()
    };
    let report = v
        .validate_recurring_leave_request(plus(7), plus(34), "u", &weekly_monday(), &options)
        .unwrap();
    assert!(!report.valid);
    assert_eq!(report.conflicts.len(), 2);
    assert_eq!(report.conflicts[0].occurrence.start, plus(14));
    assert_eq!(report.conflicts[0].events[0].id, "on-call");
    assert_eq!(report.conflicts[1].blackout_periods[0].label.as_deref(), Some("Audit"));
    assert_eq!(v.get_kind(&pattern_key("u")), Some(ErrorKind::Conflict));
}

#[test]
fn occurrence_checks_can_be_skipped() {
    let mut v = validator();
    let options = RecurringOptions {
        base: ValidationOptions {
            existing_events: vec![ExistingEvent::new("on-call", plus(14), plus(14))],
            ..ValidationOptions::default()
        },
        validate_all_occurrences: false,
        ..RecurringOptions::default()
    };
    let report = v
        .validate_recurring_leave_request(plus(7), plus(34), "u", &weekly_monday(), &options)
        .unwrap();
    assert!(report.valid);
}

#[test]
fn invalid_rule_propagates() {
    let mut v = validator();
    let pattern = RecurrencePattern {
        rrule: String::new(),
        occurrence_days: 1,
    };
    let result =
        v.validate_recurring_leave_request(plus(7), plus(34), "u", &pattern, &RecurringOptions::default());
    assert!(matches!(result, Err(GuardError::InvalidRule(_))));
}
