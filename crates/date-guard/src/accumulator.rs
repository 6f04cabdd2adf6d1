//! Keyed store of validation failures, one slot per field.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{ErrorKind, ValidationError};

/// Field key → last recorded failure. Writing to an occupied key replaces
/// the previous error.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ErrorAccumulator {
    errors: BTreeMap<String, ValidationError>,
}

impl ErrorAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_error(
        &mut self,
        field_key: &str,
        kind: ErrorKind,
        message: impl Into<String>,
        details: Option<Value>,
    ) {
        let error = ValidationError {
            kind,
            message: message.into(),
            details,
        };
        self.insert(field_key, error);
    }

    /// Upsert a prebuilt error.
    pub fn insert(&mut self, field_key: &str, error: ValidationError) {
        self.errors.insert(field_key.to_string(), error);
    }

    pub fn clear_error(&mut self, field_key: &str) {
        self.errors.remove(field_key);
    }

    pub fn reset_all(&mut self) {
        self.errors.clear();
    }

    pub fn has_error(&self, field_key: &str) -> bool {
        self.errors.contains_key(field_key)
    }

    pub fn has_any_error(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The message for `field_key`, or an empty string.
    pub fn get_message(&self, field_key: &str) -> String {
        self.errors
            .get(field_key)
            .map(|e| e.message.clone())
            .unwrap_or_default()
    }

    pub fn get_error(&self, field_key: &str) -> Option<&ValidationError> {
        self.errors.get(field_key)
    }

    pub fn get_kind(&self, field_key: &str) -> Option<ErrorKind> {
        self.errors.get(field_key).map(|e| e.kind)
    }

    /// All errors, ordered by field key.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ValidationError)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}
