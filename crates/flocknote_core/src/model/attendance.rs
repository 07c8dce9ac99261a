//! Attendance fact model.
//!
//! # Responsibility
//! - Define the canonical weekly presence fact stored by the ledger.
//! - Validate write-side entries before they reach storage.
//!
//! # Invariants
//! - At most one record exists per `(member_id, sunday_date)`.
//! - A missing record means `Presence::Unknown`, never `Presence::Absent`.
//! - Blank notes are stored as `None`.

use crate::model::date::AttendanceDate;
use crate::model::member::MemberId;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Validation failures raised before any storage access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttendanceValidationError {
    /// Date text is not a canonical `YYYY-MM-DD` calendar date.
    InvalidDate(String),
    /// Member reference is empty or whitespace.
    BlankMemberId,
    /// Range start is after range end.
    InvalidRange {
        start: AttendanceDate,
        end: AttendanceDate,
    },
    /// History window exceeds the supported maximum.
    InvalidWindow { requested: u32, max: u32 },
}

impl Display for AttendanceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidDate(value) => {
                write!(f, "invalid attendance date `{value}`; expected YYYY-MM-DD")
            }
            Self::BlankMemberId => write!(f, "member id cannot be blank"),
            Self::InvalidRange { start, end } => {
                write!(f, "range start ({start}) must be <= range end ({end})")
            }
            Self::InvalidWindow { requested, max } => {
                write!(f, "history window {requested} exceeds maximum of {max} days")
            }
        }
    }
}

impl Error for AttendanceValidationError {}

/// Tri-state presence derived from an optional ledger record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Presence {
    Present,
    /// Explicitly recorded as not present.
    Absent,
    /// No record exists for the member/date pair.
    Unknown,
}

impl Presence {
    pub fn from_record(record: Option<&AttendanceRecord>) -> Self {
        match record {
            Some(record) if record.present => Self::Present,
            Some(_) => Self::Absent,
            None => Self::Unknown,
        }
    }

    pub fn is_present(self) -> bool {
        matches!(self, Self::Present)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
            Self::Unknown => "unknown",
        }
    }
}

/// Write-side shape for one member in a bulk upsert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceEntry {
    pub member_id: MemberId,
    pub present: bool,
    pub notes: Option<String>,
}

impl AttendanceEntry {
    pub fn new(member_id: impl Into<MemberId>, present: bool) -> Self {
        Self {
            member_id: member_id.into(),
            present,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Validates write-side invariants.
    pub fn validate(&self) -> Result<(), AttendanceValidationError> {
        if self.member_id.trim().is_empty() {
            return Err(AttendanceValidationError::BlankMemberId);
        }
        Ok(())
    }

    /// Returns the trimmed member id and normalized notes used for storage.
    pub fn normalized(&self) -> (String, Option<String>) {
        (
            self.member_id.trim().to_string(),
            normalize_notes(self.notes.as_deref()),
        )
    }
}

/// Canonical attendance fact keyed by `(member_id, sunday_date)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub member_id: MemberId,
    /// Named after the weekly meeting day; any calendar date is accepted.
    pub sunday_date: AttendanceDate,
    pub present: bool,
    pub notes: Option<String>,
}

impl AttendanceRecord {
    pub fn presence(&self) -> Presence {
        Presence::from_record(Some(self))
    }
}

/// Trims notes and maps blank values to `None`.
pub fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
