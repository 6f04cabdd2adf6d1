//! Validation options and the custom-rule hook.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::context::ValidationContext;
use crate::error::{ErrorKind, GuardError, Result};
use crate::range::{BlackoutPeriod, ExistingEvent};

/// Rule configuration for one validation call.
///
/// Every rule is off unless configured, with three exceptions that carry
/// defaults: `required` (true), `allow_past_dates` (false) and
/// `allow_future_dates` (true). Day counts are whole calendar days.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    pub required: bool,
    pub allow_past_dates: bool,
    pub allow_future_dates: bool,
    pub min_date: Option<NaiveDate>,
    pub max_date: Option<NaiveDate>,
    pub disallow_weekends: bool,
    pub holidays: Vec<NaiveDate>,
    /// Inclusive range length bounds, in calendar days.
    pub min_duration: Option<i64>,
    pub max_duration: Option<i64>,
    /// Minimum days between today and the date.
    pub min_advance_notice: Option<i64>,
    /// Maximum days between today and the date.
    pub max_advance_booking: Option<i64>,
    pub blackout_periods: Vec<BlackoutPeriod>,
    pub existing_events: Vec<ExistingEvent>,
    pub event_id_to_ignore: Option<String>,
    pub available_days_per_year: Option<i64>,
    /// Charge quota in business days instead of calendar days.
    pub business_days_only: bool,
    #[serde(skip)]
    pub custom_validation: Option<CustomRule>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            required: true,
            allow_past_dates: false,
            allow_future_dates: true,
            min_date: None,
            max_date: None,
            disallow_weekends: false,
            holidays: Vec::new(),
            min_duration: None,
            max_duration: None,
            min_advance_notice: None,
            max_advance_booking: None,
            blackout_periods: Vec::new(),
            existing_events: Vec::new(),
            event_id_to_ignore: None,
            available_days_per_year: None,
            business_days_only: false,
            custom_validation: None,
        }
    }
}

impl ValidationOptions {
    /// Reject option bundles that cannot describe any valid date.
    ///
    /// # Errors
    /// Returns `GuardError::InvalidOptions` for negative day counts, a
    /// `min_date` after `max_date`, or a minimum above its maximum.
    pub fn check(&self) -> Result<()> {
        if let (Some(min), Some(max)) = (self.min_date, self.max_date) {
            if min > max {
                return Err(GuardError::InvalidOptions(format!(
                    "min_date {min} is after max_date {max}"
                )));
            }
        }

        let counts = [
            ("min_duration", self.min_duration),
            ("max_duration", self.max_duration),
            ("min_advance_notice", self.min_advance_notice),
            ("max_advance_booking", self.max_advance_booking),
            ("available_days_per_year", self.available_days_per_year),
        ];
        for (name, value) in counts {
            if let Some(v) = value {
                if v < 0 {
                    return Err(GuardError::InvalidOptions(format!(
                        "{name} must not be negative, got {v}"
                    )));
                }
            }
        }

        if let (Some(min), Some(max)) = (self.min_duration, self.max_duration) {
            if min > max {
                return Err(GuardError::InvalidOptions(format!(
                    "min_duration {min} exceeds max_duration {max}"
                )));
            }
        }
        if let (Some(min), Some(max)) = (self.min_advance_notice, self.max_advance_booking) {
            if min > max {
                return Err(GuardError::InvalidOptions(format!(
                    "min_advance_notice {min} exceeds max_advance_booking {max}"
                )));
            }
        }
        Ok(())
    }
}

/// What a custom rule concluded about a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    /// The rule explicitly accepts the date.
    Pass,
    /// The rule has no opinion on this date.
    Abstain,
    /// The rule rejects the date. `kind` defaults to [`ErrorKind::Other`].
    Fail {
        kind: Option<ErrorKind>,
        message: Option<String>,
    },
}

impl RuleOutcome {
    pub fn fail(message: impl Into<String>) -> Self {
        RuleOutcome::Fail {
            kind: None,
            message: Some(message.into()),
        }
    }

    pub fn fail_with(kind: ErrorKind, message: impl Into<String>) -> Self {
        RuleOutcome::Fail {
            kind: Some(kind),
            message: Some(message.into()),
        }
    }
}

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type RuleFn = dyn Fn(NaiveDate, &ValidationContext) -> std::result::Result<RuleOutcome, BoxError>
    + Send
    + Sync;

/// A caller-supplied predicate run after the built-in rules.
#[derive(Clone)]
pub struct CustomRule(Arc<RuleFn>);

impl CustomRule {
    pub fn new<F>(rule: F) -> Self
    where
        F: Fn(NaiveDate, &ValidationContext) -> std::result::Result<RuleOutcome, BoxError>
            + Send
            + Sync
            + 'static,
    {
        Self(Arc::new(rule))
    }

    /// Run the rule. An `Err` or a panic inside the rule becomes a
    /// [`ErrorKind::Other`] failure instead of reaching the caller.
    pub fn evaluate(&self, date: NaiveDate, context: &ValidationContext) -> RuleOutcome {
        match catch_unwind(AssertUnwindSafe(|| (self.0)(date, context))) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::warn!(%date, "custom rule returned an error: {e}");
                RuleOutcome::fail_with(ErrorKind::Other, format!("Custom validation failed: {e}"))
            }
            Err(_) => {
                tracing::warn!(%date, "custom rule panicked");
                RuleOutcome::fail_with(ErrorKind::Other, "Custom validation failed")
            }
        }
    }
}

impl fmt::Debug for CustomRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomRule(..)")
    }
}
