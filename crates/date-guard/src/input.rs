//! Date inputs as they arrive from forms and request bodies, and their
//! normalization to calendar days.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Accepted text layouts for calendar dates, tried in order.
const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%d/%m/%Y"];
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Default display layout used in messages.
pub const DEFAULT_DISPLAY_FORMAT: &str = "%d/%m/%Y";

/// A date value before normalization.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DateInput {
    #[default]
    Missing,
    Date(NaiveDate),
    Instant(DateTime<Utc>),
    Text(String),
}

/// The outcome of normalizing a [`DateInput`].
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    /// Absent, or text that is blank.
    Missing,
    /// Non-empty text that is not a recognizable date.
    Invalid(String),
    Date(NaiveDate),
}

impl DateInput {
    /// Reduce the input to a calendar day in `tz`.
    ///
    /// Instants and offset-bearing timestamps are shifted into `tz` before the
    /// time of day is dropped; naive timestamps are taken as already local.
    pub fn normalize(&self, tz: Tz) -> Normalized {
        match self {
            DateInput::Missing => Normalized::Missing,
            DateInput::Date(date) => Normalized::Date(*date),
            DateInput::Instant(instant) => Normalized::Date(instant.with_timezone(&tz).date_naive()),
            DateInput::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    return Normalized::Missing;
                }
                match parse_date_text(trimmed, tz) {
                    Some(date) => Normalized::Date(date),
                    None => Normalized::Invalid(trimmed.to_string()),
                }
            }
        }
    }
}

impl From<NaiveDate> for DateInput {
    fn from(date: NaiveDate) -> Self {
        DateInput::Date(date)
    }
}

impl From<DateTime<Utc>> for DateInput {
    fn from(instant: DateTime<Utc>) -> Self {
        DateInput::Instant(instant)
    }
}

impl From<&str> for DateInput {
    fn from(text: &str) -> Self {
        DateInput::Text(text.to_string())
    }
}

impl From<String> for DateInput {
    fn from(text: String) -> Self {
        DateInput::Text(text)
    }
}

impl<T: Into<DateInput>> From<Option<T>> for DateInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(DateInput::Missing, Into::into)
    }
}

fn parse_date_text(text: &str, tz: Tz) -> Option<NaiveDate> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(text) {
        return Some(stamp.with_timezone(&tz).date_naive());
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|local| local.date())
}

/// True for non-blank text that parses as a calendar date.
pub fn is_valid_date_string(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && parse_date_text(trimmed, Tz::UTC).is_some()
}

/// Render a date for display. `pattern` defaults to `dd/mm/yyyy`.
pub fn format_date(date: NaiveDate, pattern: Option<&str>) -> String {
    date.format(pattern.unwrap_or(DEFAULT_DISPLAY_FORMAT)).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_iso_and_french_layouts() {
        let tz = Tz::UTC;
        assert_eq!(DateInput::from("2023-05-15").normalize(tz), Normalized::Date(d(2023, 5, 15)));
        assert_eq!(DateInput::from("15/05/2023").normalize(tz), Normalized::Date(d(2023, 5, 15)));
        assert_eq!(
            DateInput::from("2023-05-15T10:30:00").normalize(tz),
            Normalized::Date(d(2023, 5, 15))
        );
    }

    #[test]
    fn rfc3339_is_shifted_into_timezone() {
        let input = DateInput::from("2026-03-15T23:30:00Z");
        assert_eq!(input.normalize(Tz::UTC), Normalized::Date(d(2026, 3, 15)));
        assert_eq!(input.normalize(chrono_tz::Europe::Paris), Normalized::Date(d(2026, 3, 16)));
    }

    #[test]
    fn blank_text_is_missing() {
        assert_eq!(DateInput::from("   ").normalize(Tz::UTC), Normalized::Missing);
        assert_eq!(DateInput::from(None::<NaiveDate>).normalize(Tz::UTC), Normalized::Missing);
    }

    #[test]
    fn garbage_is_invalid() {
        assert_eq!(
            DateInput::from("not-a-date").normalize(Tz::UTC),
            Normalized::Invalid("not-a-date".to_string())
        );
        assert!(!is_valid_date_string("not-a-date"));
        assert!(!is_valid_date_string(""));
        assert!(is_valid_date_string("2023-05-15"));
    }

    #[test]
    fn formats_with_default_and_custom_patterns() {
        assert_eq!(format_date(d(2023, 5, 5), None), "05/05/2023");
        assert_eq!(format_date(d(2023, 5, 5), Some("%Y-%m-%d")), "2023-05-05");
    }
}
