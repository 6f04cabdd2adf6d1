//! Per-session side channel that rules read and the range engine writes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::range::DateRange;

/// Quota figures and conflict results shared across the calls of one form.
///
/// `extra` carries host-specific fields (for example `user_id`) and is
/// flattened when serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub used_days: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_days: Option<i64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conflicts: Vec<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_days_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_days_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_days_per_year: Option<i64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ValidationContext {
    /// Overlay the fields set in `patch` onto `self`.
    ///
    /// `None` and empty collections in the patch leave the current value alone;
    /// `extra` entries are inserted key by key.
    pub fn merge(&mut self, patch: ValidationContext) {
        if patch.used_days.is_some() {
            self.used_days = patch.used_days;
        }
        if patch.remaining_days.is_some() {
            self.remaining_days = patch.remaining_days;
        }
        if !patch.conflicts.is_empty() {
            self.conflicts = patch.conflicts;
        }
        if patch.business_days_count.is_some() {
            self.business_days_count = patch.business_days_count;
        }
        if patch.total_days_count.is_some() {
            self.total_days_count = patch.total_days_count;
        }
        if patch.available_days_per_year.is_some() {
            self.available_days_per_year = patch.available_days_per_year;
        }
        self.extra.extend(patch.extra);
    }

    pub fn get_extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }

    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.extra.insert(key.into(), value.into());
    }
}
