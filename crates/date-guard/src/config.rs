//! Engine configuration, loaded from TOML.
//!
//! ```toml
//! timezone = "Europe/Paris"
//!
//! [leave]
//! min_advance_notice = 1
//!
//! [cache]
//! ttl_secs = 300
//! capacity = 100
//!
//! [recurring]
//! max_occurrences = 50
//! max_generation_years = 2
//! ```
//!
//! Every key is optional.

use std::path::Path;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{GuardError, Result};
use crate::options::ValidationOptions;
use crate::recurring::check_occurrence_limit;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GuardConfig {
    /// IANA timezone used to decide what "today" is.
    pub timezone: String,
    pub leave: LeaveDefaults,
    pub cache: CacheConfig,
    pub recurring: RecurringDefaults,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            leave: LeaveDefaults::default(),
            cache: CacheConfig::default(),
            recurring: RecurringDefaults::default(),
        }
    }
}

impl GuardConfig {
    /// Parse and check a TOML document.
    ///
    /// # Errors
    /// `GuardError::Config` for malformed TOML or unknown keys,
    /// `GuardError::InvalidTimezone` for an unknown IANA name,
    /// `GuardError::InvalidOptions` for a `max_occurrences` at or above the
    /// expansion cap.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: GuardConfig = toml::from_str(text)?;
        config.tz()?;
        check_occurrence_limit(config.recurring.max_occurrences)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| GuardError::InvalidTimezone(self.timezone.clone()))
    }
}

/// Defaults applied to leave requests before caller overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LeaveDefaults {
    pub required: bool,
    pub allow_past_dates: bool,
    pub min_advance_notice: Option<i64>,
    pub disallow_weekends: bool,
    pub available_days_per_year: Option<i64>,
}

impl Default for LeaveDefaults {
    fn default() -> Self {
        Self {
            required: true,
            allow_past_dates: false,
            min_advance_notice: Some(1),
            disallow_weekends: false,
            available_days_per_year: None,
        }
    }
}

impl LeaveDefaults {
    pub fn to_options(&self) -> ValidationOptions {
        ValidationOptions {
            required: self.required,
            allow_past_dates: self.allow_past_dates,
            min_advance_notice: self.min_advance_notice,
            disallow_weekends: self.disallow_weekends,
            available_days_per_year: self.available_days_per_year,
            ..ValidationOptions::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            capacity: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RecurringDefaults {
    pub max_occurrences: usize,
    pub max_generation_years: u32,
}

impl Default for RecurringDefaults {
    fn default() -> Self {
        Self {
            max_occurrences: 50,
            max_generation_years: 2,
        }
    }
}
