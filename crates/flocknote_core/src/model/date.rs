//! Canonical calendar-date key for attendance facts.
//!
//! # Responsibility
//! - Parse and format the single date representation used by every ledger
//!   operation (`YYYY-MM-DD`).
//! - Provide week arithmetic for Sunday-keyed snapshots.
//!
//! # Invariants
//! - An `AttendanceDate` never carries a time or timezone component.
//! - Two dates compare equal iff their canonical strings are equal.

use crate::model::attendance::AttendanceValidationError;
use chrono::{Datelike, Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const CANONICAL_FORMAT: &str = "%Y-%m-%d";

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid iso date regex"));

/// Date-only key for attendance records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AttendanceDate(NaiveDate);

impl AttendanceDate {
    /// Parses a canonical `YYYY-MM-DD` string.
    ///
    /// Surrounding whitespace is ignored. Timestamps, week dates and
    /// non-padded forms are rejected so callers cannot create a second key
    /// for the same day.
    pub fn parse(value: &str) -> Result<Self, AttendanceValidationError> {
        let trimmed = value.trim();
        if !ISO_DATE_RE.is_match(trimmed) {
            return Err(AttendanceValidationError::InvalidDate(trimmed.to_string()));
        }

        NaiveDate::parse_from_str(trimmed, CANONICAL_FORMAT)
            .map(Self)
            .map_err(|_| AttendanceValidationError::InvalidDate(trimmed.to_string()))
    }

    /// Builds a date from calendar parts. Returns `None` for impossible dates.
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Returns the local calendar date of the current process clock.
    pub fn today() -> Self {
        Self(chrono::Local::now().date_naive())
    }

    pub fn as_naive(self) -> NaiveDate {
        self.0
    }

    /// Returns the Sunday on or before this date.
    pub fn most_recent_sunday(self) -> Self {
        let offset = u64::from(self.0.weekday().num_days_from_sunday());
        self.days_before(offset)
    }

    pub fn is_sunday(self) -> bool {
        self.0.weekday().num_days_from_sunday() == 0
    }

    /// Steps `days` calendar days backward, saturating at the minimum date.
    pub fn days_before(self, days: u64) -> Self {
        Self(self.0.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN))
    }

    pub fn weeks_before(self, weeks: u64) -> Self {
        self.days_before(weeks.saturating_mul(7))
    }

    /// Canonical storage/wire string.
    pub fn to_key(self) -> String {
        self.0.format(CANONICAL_FORMAT).to_string()
    }
}

impl From<NaiveDate> for AttendanceDate {
    fn from(value: NaiveDate) -> Self {
        Self(value)
    }
}

impl Display for AttendanceDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for AttendanceDate {
    type Err = AttendanceValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for AttendanceDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_key())
    }
}

impl<'de> Deserialize<'de> for AttendanceDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::AttendanceDate;

    fn date(value: &str) -> AttendanceDate {
        AttendanceDate::parse(value).expect("valid test date")
    }

    #[test]
    fn parse_accepts_canonical_and_trims() {
        assert_eq!(date(" 2024-03-10 ").to_key(), "2024-03-10");
    }

    #[test]
    fn parse_rejects_non_canonical_shapes() {
        for raw in [
            "2024-3-10",
            "2024-03-10T00:00:00Z",
            "10/03/2024",
            "2024-02-30",
            "",
        ] {
            assert!(AttendanceDate::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn most_recent_sunday_is_identity_on_sundays() {
        let sunday = date("2024-03-10");
        assert!(sunday.is_sunday());
        assert_eq!(sunday.most_recent_sunday(), sunday);
    }

    #[test]
    fn most_recent_sunday_steps_back_within_week() {
        assert_eq!(date("2024-03-16").most_recent_sunday(), date("2024-03-10"));
        assert_eq!(date("2024-03-11").most_recent_sunday(), date("2024-03-10"));
    }

    #[test]
    fn weeks_before_crosses_month_boundary() {
        assert_eq!(date("2024-03-03").weeks_before(1), date("2024-02-25"));
    }
}
