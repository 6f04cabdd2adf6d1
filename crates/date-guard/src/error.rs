//! Error types for date-guard.
//!
//! Two families live here. [`ErrorKind`] and [`ValidationError`] describe
//! *validation failures*: they are ordinary data, recorded in the
//! [`ErrorAccumulator`](crate::accumulator::ErrorAccumulator) and rendered next
//! to a form input. [`GuardError`] covers *programmer errors* (malformed
//! options, bad recurrence rules, bad configuration) and is returned as `Err`.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The closed set of reasons a date or range can be rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Required,
    InvalidFormat,
    PastDate,
    FutureDate,
    Weekend,
    Holiday,
    StartAfterEnd,
    MinDuration,
    MaxDuration,
    MinAdvanceNotice,
    MaxAdvanceBooking,
    BlackoutPeriod,
    /// Overlap with an existing event or range.
    #[serde(alias = "overlap")]
    Conflict,
    ExceedsAvailableDays,
    /// Bound violations and custom-rule failures.
    Other,
}

impl ErrorKind {
    /// Stable snake_case code, identical to the serde representation.
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Required => "required",
            ErrorKind::InvalidFormat => "invalid_format",
            ErrorKind::PastDate => "past_date",
            ErrorKind::FutureDate => "future_date",
            ErrorKind::Weekend => "weekend",
            ErrorKind::Holiday => "holiday",
            ErrorKind::StartAfterEnd => "start_after_end",
            ErrorKind::MinDuration => "min_duration",
            ErrorKind::MaxDuration => "max_duration",
            ErrorKind::MinAdvanceNotice => "min_advance_notice",
            ErrorKind::MaxAdvanceBooking => "max_advance_booking",
            ErrorKind::BlackoutPeriod => "blackout_period",
            ErrorKind::Conflict => "conflict",
            ErrorKind::ExceedsAvailableDays => "exceeds_available_days",
            ErrorKind::Other => "other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One recorded validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub kind: ErrorKind,
    /// Ready-to-display message.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ValidationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Programmer errors. Validation-policy violations never surface here.
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Invalid recurrence rule: {0}")]
    InvalidRule(String),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GuardError>;
