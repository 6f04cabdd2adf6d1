//! Single-date rule engine.
//!
//! Checks run in a fixed order and the first failure wins:
//! presence, format, past/future, weekend, holiday, min/max date, blackout,
//! advance notice, custom rule. Exactly one error is recorded per failing call.

use chrono::NaiveDate;
use serde_json::json;

use crate::blackout::blackout_containing;
use crate::calendar::{is_weekend, HolidaySet};
use crate::error::{ErrorKind, Result, ValidationError};
use crate::input::{format_date, DateInput, Normalized};
use crate::options::{RuleOutcome, ValidationOptions};
use crate::session::ValidationSession;

pub(crate) type RuleResult<T> = std::result::Result<T, ValidationError>;

/// "1 day" / "3 days".
pub(crate) fn plural_days(n: i64) -> String {
    if n.abs() == 1 {
        format!("{n} day")
    } else {
        format!("{n} days")
    }
}

impl ValidationSession {
    /// Validate one date and record the outcome under `field_key`.
    ///
    /// Returns `Ok(false)` when a rule rejects the date (the error is readable
    /// through [`get_message`](Self::get_message) and friends) and `Ok(true)`
    /// otherwise, clearing any previous error for the key.
    ///
    /// # Errors
    /// `GuardError::InvalidOptions` when `options` fail
    /// [`ValidationOptions::check`].
    pub fn validate_date(
        &mut self,
        date: impl Into<DateInput>,
        field_key: &str,
        options: &ValidationOptions,
    ) -> Result<bool> {
        options.check()?;
        let today = self.today();
        let holidays = HolidaySet::from_dates(&options.holidays);

        let outcome = self
            .normalize_input(&date.into(), options.required)
            .and_then(|day| match day {
                Some(day) => self.check_date_rules(day, options, today, &holidays),
                None => Ok(()),
            });

        Ok(match outcome {
            Ok(()) => self.accept(field_key),
            Err(error) => self.reject(field_key, error),
        })
    }

    /// Presence and format. `Ok(None)` means "empty and optional": nothing
    /// further to check.
    pub(crate) fn normalize_input(
        &self,
        input: &DateInput,
        required: bool,
    ) -> RuleResult<Option<NaiveDate>> {
        match input.normalize(self.timezone()) {
            Normalized::Date(day) => Ok(Some(day)),
            Normalized::Missing if required => {
                Err(ValidationError::new(ErrorKind::Required, "This date is required"))
            }
            Normalized::Missing => Ok(None),
            Normalized::Invalid(text) => Err(ValidationError::new(
                ErrorKind::InvalidFormat,
                format!("'{text}' is not a valid date"),
            )
            .with_details(json!({ "input": text }))),
        }
    }

    /// Every rule after presence and format, in order.
    pub(crate) fn check_date_rules(
        &self,
        date: NaiveDate,
        options: &ValidationOptions,
        today: NaiveDate,
        holidays: &HolidaySet,
    ) -> RuleResult<()> {
        if !options.allow_past_dates && date < today {
            return Err(ValidationError::new(
                ErrorKind::PastDate,
                "Dates in the past are not allowed",
            )
            .with_details(json!({ "date": date, "today": today })));
        }
        if !options.allow_future_dates && date > today {
            return Err(ValidationError::new(
                ErrorKind::FutureDate,
                "Dates in the future are not allowed",
            )
            .with_details(json!({ "date": date, "today": today })));
        }

        if options.disallow_weekends && is_weekend(date) {
            return Err(ValidationError::new(
                ErrorKind::Weekend,
                "Weekend days are not allowed",
            ));
        }

        if !holidays.is_empty() && holidays.contains(date) {
            return Err(ValidationError::new(
                ErrorKind::Holiday,
                format!("{} is a public holiday", format_date(date, None)),
            )
            .with_details(json!({ "date": date })));
        }

        if let Some(min) = options.min_date {
            if date < min {
                return Err(ValidationError::new(
                    ErrorKind::Other,
                    format!("The date must be on or after {}", format_date(min, None)),
                )
                .with_details(json!({ "bound": "min_date", "limit": min })));
            }
        }
        if let Some(max) = options.max_date {
            if date > max {
                return Err(ValidationError::new(
                    ErrorKind::Other,
                    format!("The date must be on or before {}", format_date(max, None)),
                )
                .with_details(json!({ "bound": "max_date", "limit": max })));
            }
        }

        if let Some(period) = blackout_containing(date, &options.blackout_periods) {
            let message = match &period.label {
                Some(label) => format!(
                    "{} falls within the blackout period \"{label}\"",
                    format_date(date, None)
                ),
                None => format!("{} falls within a blackout period", format_date(date, None)),
            };
            return Err(ValidationError::new(ErrorKind::BlackoutPeriod, message)
                .with_details(json!({ "period": period })));
        }

        let lead = (date - today).num_days();
        if let Some(min) = options.min_advance_notice {
            if lead < min {
                return Err(ValidationError::new(
                    ErrorKind::MinAdvanceNotice,
                    format!("At least {} of advance notice are required", plural_days(min)),
                )
                .with_details(json!({ "required": min, "actual": lead })));
            }
        }
        if let Some(max) = options.max_advance_booking {
            if lead > max {
                return Err(ValidationError::new(
                    ErrorKind::MaxAdvanceBooking,
                    format!("Dates cannot be booked more than {} in advance", plural_days(max)),
                )
                .with_details(json!({ "allowed": max, "actual": lead })));
            }
        }

        if let Some(rule) = &options.custom_validation {
            if let RuleOutcome::Fail { kind, message } = rule.evaluate(date, &self.context) {
                return Err(ValidationError::new(
                    kind.unwrap_or(ErrorKind::Other),
                    message.unwrap_or_else(|| "This date is not allowed".to_string()),
                ));
            }
        }

        Ok(())
    }
}
