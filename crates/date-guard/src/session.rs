//! The validation session: error accumulator, context and clock for one
//! form or request.
//!
//! Sessions are plain owned values. Hosts create one per in-flight form and
//! drop it when done; nothing is shared between sessions.

use std::fmt;

use chrono::NaiveDate;
use chrono_tz::Tz;

use crate::accumulator::ErrorAccumulator;
use crate::clock::{Clock, SystemClock};
use crate::config::GuardConfig;
use crate::context::ValidationContext;
use crate::error::{ErrorKind, Result, ValidationError};

pub struct ValidationSession {
    pub(crate) errors: ErrorAccumulator,
    pub(crate) context: ValidationContext,
    clock: Box<dyn Clock + Send>,
    timezone: Tz,
}

impl ValidationSession {
    /// A session on the system clock in UTC.
    pub fn new() -> Self {
        Self::with_clock(SystemClock::default(), Tz::UTC)
    }

    /// `timezone` is used to map instants (timestamps) onto calendar days.
    pub fn with_clock(clock: impl Clock + Send + 'static, timezone: Tz) -> Self {
        Self {
            errors: ErrorAccumulator::new(),
            context: ValidationContext::default(),
            clock: Box::new(clock),
            timezone,
        }
    }

    /// A session on the system clock in the configured timezone.
    pub fn from_config(config: &GuardConfig) -> Result<Self> {
        let tz = config.tz()?;
        Ok(Self::with_clock(SystemClock::new(tz), tz))
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    // ── Accumulator read/write ──────────────────────────────────────────

    pub fn errors(&self) -> &ErrorAccumulator {
        &self.errors
    }

    pub fn has_error(&self, field_key: &str) -> bool {
        self.errors.has_error(field_key)
    }

    pub fn has_any_error(&self) -> bool {
        self.errors.has_any_error()
    }

    pub fn get_message(&self, field_key: &str) -> String {
        self.errors.get_message(field_key)
    }

    pub fn get_error(&self, field_key: &str) -> Option<&ValidationError> {
        self.errors.get_error(field_key)
    }

    pub fn get_kind(&self, field_key: &str) -> Option<ErrorKind> {
        self.errors.get_kind(field_key)
    }

    pub fn set_error(&mut self, field_key: &str, error: ValidationError) {
        self.errors.insert(field_key, error);
    }

    pub fn clear_error(&mut self, field_key: &str) {
        self.errors.clear_error(field_key);
    }

    pub fn reset_errors(&mut self) {
        self.errors.reset_all();
    }

    /// Clear every error and the context.
    pub fn reset_all(&mut self) {
        self.errors.reset_all();
        self.context = ValidationContext::default();
    }

    // ── Context ─────────────────────────────────────────────────────────

    pub fn context(&self) -> &ValidationContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut ValidationContext {
        &mut self.context
    }

    /// Merge `patch` into the current context. See [`ValidationContext::merge`].
    pub fn set_context(&mut self, patch: ValidationContext) {
        self.context.merge(patch);
    }

    pub fn reset_context(&mut self) {
        self.context = ValidationContext::default();
    }

    // ── Recording helpers ───────────────────────────────────────────────

    /// Record `error` under `field_key` and return `false`.
    pub(crate) fn reject(&mut self, field_key: &str, error: ValidationError) -> bool {
        tracing::debug!(field = field_key, kind = %error.kind, "{}", error.message);
        self.errors.insert(field_key, error);
        false
    }

    /// Clear `field_key` and return `true`.
    pub(crate) fn accept(&mut self, field_key: &str) -> bool {
        tracing::trace!(field = field_key, "validation passed");
        self.errors.clear_error(field_key);
        true
    }
}

impl Default for ValidationSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ValidationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationSession")
            .field("errors", &self.errors)
            .field("context", &self.context)
            .field("timezone", &self.timezone)
            .finish_non_exhaustive()
    }
}
