//! Leave-request validation on top of the range engine.
//!
//! Field keys are derived from the user id (`leave_start_{user}` /
//! `leave_end_{user}`), so forms for several users can share one session
//! without their errors colliding.

use std::collections::HashMap;

use crate::cache::{CacheStatistics, ValidationCache};
use crate::config::{GuardConfig, LeaveDefaults};
use crate::context::ValidationContext;
use crate::error::{ErrorKind, Result, ValidationError};
use crate::input::{DateInput, Normalized};
use crate::options::ValidationOptions;
use crate::session::ValidationSession;

/// Where the leave adapter reads how many days a user has already taken this
/// year.
pub trait QuotaSource {
    fn used_days(&self, user_id: &str) -> Option<i64>;
}

impl QuotaSource for HashMap<String, i64> {
    fn used_days(&self, user_id: &str) -> Option<i64> {
        self.get(user_id).copied()
    }
}

pub fn start_key(user_id: &str) -> String {
    format!("leave_start_{user_id}")
}

pub fn end_key(user_id: &str) -> String {
    format!("leave_end_{user_id}")
}

pub struct LeaveValidator {
    session: ValidationSession,
    defaults: LeaveDefaults,
    quota: Option<Box<dyn QuotaSource + Send>>,
    cache: ValidationCache,
}

impl LeaveValidator {
    pub fn new(session: ValidationSession) -> Self {
        Self::with_config(session, &GuardConfig::default())
    }

    /// A validator on the system clock, with leave and cache defaults taken
    /// from `config`.
    pub fn from_config(config: &GuardConfig) -> Result<Self> {
        Ok(Self::with_config(ValidationSession::from_config(config)?, config))
    }

    /// Like [`from_config`](Self::from_config) but on a caller-built session.
    pub fn with_config(session: ValidationSession, config: &GuardConfig) -> Self {
        Self {
            session,
            defaults: config.leave.clone(),
            quota: None,
            cache: ValidationCache::from_config(&config.cache),
        }
    }

    pub fn with_quota_source(mut self, quota: impl QuotaSource + Send + 'static) -> Self {
        self.quota = Some(Box::new(quota));
        self
    }

    pub fn with_cache(mut self, cache: ValidationCache) -> Self {
        self.cache = cache;
        self
    }

    /// The leave defaults as a starting point for per-request options:
    /// required dates, no past dates, one day of notice, weekends allowed.
    pub fn default_options(&self) -> ValidationOptions {
        self.defaults.to_options()
    }

    /// Validate a leave request for `user_id`.
    ///
    /// Missing endpoints fail with `Required` on their own key before any range
    /// logic runs. When `options.available_days_per_year` is set and a quota
    /// source is attached, the context's `used_days` is taken from it first.
    /// Results are memoized (see [`ValidationCache`]) unless the options carry
    /// a custom rule; a cache hit restores the context as it was after the
    /// original call.
    ///
    /// # Errors
    /// `GuardError::InvalidOptions` when `options` fail
    /// [`ValidationOptions::check`].
    pub fn validate_leave_request(
        &mut self,
        start: impl Into<DateInput>,
        end: impl Into<DateInput>,
        user_id: &str,
        options: &ValidationOptions,
    ) -> Result<bool> {
        options.check()?;
        let (start, end) = (start.into(), end.into());
        let (start_key, end_key) = (start_key(user_id), end_key(user_id));

        if options.available_days_per_year.is_some() {
            self.load_used_days(user_id);
        }

        let cache_key = if options.custom_validation.is_none() {
            let used = self.session.context.used_days;
            let today = self.session.today();
            serde_json::to_string(&(&start, &end, user_id, options, used, today)).ok()
        } else {
            None
        };

        if let Some(key) = &cache_key {
            if let Some(cached) = self.cache.get(key) {
                self.session.clear_error(&start_key);
                self.session.clear_error(&end_key);
                for (field, error) in cached.errors {
                    self.session.set_error(&field, error);
                }
                self.session.context = cached.context;
                return Ok(cached.valid);
            }
        }

        self.session.clear_error(&start_key);
        self.session.clear_error(&end_key);

        let start_missing = self.report_missing(&start, &start_key, "start");
        let end_missing = self.report_missing(&end, &end_key, "end");
        let valid = if start_missing || end_missing {
            false
        } else {
            self.session
                .validate_date_range(start, end, &start_key, &end_key, options)?
        };

        if let Some(key) = cache_key {
            let errors = [&start_key, &end_key]
                .into_iter()
                .filter_map(|k| self.session.get_error(k).map(|e| (k.clone(), e.clone())))
                .collect();
            self.cache
                .insert(key, valid, errors, self.session.context.clone());
        }
        Ok(valid)
    }

    /// Copy the user's used days from the quota source into the context.
    /// A user the source does not know leaves `used_days` unset.
    pub(crate) fn load_used_days(&mut self, user_id: &str) {
        if let Some(quota) = self.quota.as_ref() {
            self.session.context.used_days = quota.used_days(user_id);
        }
    }

    /// Record `Required` for an absent endpoint. Returns true if it was absent.
    fn report_missing(&mut self, input: &DateInput, key: &str, which: &str) -> bool {
        if input.normalize(self.session.timezone()) != Normalized::Missing {
            return false;
        }
        self.session.reject(
            key,
            ValidationError::new(ErrorKind::Required, format!("The {which} date is required")),
        );
        true
    }

    pub fn session(&self) -> &ValidationSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ValidationSession {
        &mut self.session
    }

    pub fn has_error(&self, field_key: &str) -> bool {
        self.session.has_error(field_key)
    }

    pub fn get_message(&self, field_key: &str) -> String {
        self.session.get_message(field_key)
    }

    pub fn get_kind(&self, field_key: &str) -> Option<ErrorKind> {
        self.session.get_kind(field_key)
    }

    pub fn reset_errors(&mut self) {
        self.session.reset_errors();
    }

    pub fn context(&self) -> &ValidationContext {
        self.session.context()
    }

    pub fn set_context(&mut self, patch: ValidationContext) {
        self.session.set_context(patch);
    }

    pub fn cache_statistics(&self) -> CacheStatistics {
        self.cache.statistics()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}
