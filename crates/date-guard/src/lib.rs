//! # date-guard
//!
//! Date and date-range validation for scheduling and leave forms.
//!
//! A [`ValidationSession`] checks dates against a set of rules (past/future,
//! weekends, holidays, bounds, blackout periods, advance notice, durations,
//! conflicts with existing events, leave quota) and keeps one human-readable
//! error per form field, plus a [`ValidationContext`] of derived figures.
//!
//! ## Modules
//!
//! - [`range`]: calendar-day intervals, overlap and duration arithmetic
//! - [`calendar`]: weekend, holiday and business-day predicates
//! - [`blackout`]: blackout periods and conflicting events
//! - [`input`]: raw date input normalization and display formatting
//! - [`options`]: per-call rule configuration and custom rules
//! - [`session`]: error accumulator plus context; entry points live in
//!   [`date_rules`] and [`range_rules`]
//! - [`leave`]: leave-request adapter with quota lookup and result cache
//! - [`recurring`]: RRULE-based recurring leave requests
//! - [`config`]: TOML-backed defaults
//! - [`error`]: Error types

pub mod accumulator;
pub mod blackout;
pub mod cache;
pub mod calendar;
pub mod clock;
pub mod config;
pub mod context;
pub mod date_rules;
pub mod error;
pub mod input;
pub mod leave;
pub mod options;
pub mod range;
pub mod range_rules;
pub mod recurring;
pub mod session;

pub use accumulator::ErrorAccumulator;
pub use blackout::{find_conflicting_events, is_date_in_blackout, is_range_in_blackout};
pub use calendar::{is_business_day, is_holiday, is_weekend, HolidaySet};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::GuardConfig;
pub use context::ValidationContext;
pub use error::{ErrorKind, GuardError, ValidationError};
pub use input::{format_date, is_valid_date_string, DateInput};
pub use leave::{LeaveValidator, QuotaSource};
pub use options::{CustomRule, RuleOutcome, ValidationOptions};
pub use range::{
    contains, duration_business_days, duration_calendar_days, find_overlaps, overlaps,
    BlackoutPeriod, DateRange, ExistingEvent,
};
pub use recurring::{RecurrencePattern, RecurringOptions, RecurringReport};
pub use session::ValidationSession;
