//! Derived follow-up and reporting projections.
//!
//! # Invariants
//! - None of these types are persisted; they are recomputed from the ledger.
//! - `HistoryPoint::percentage` is 0 whenever `total_count == 0`.

use crate::model::date::AttendanceDate;
use crate::model::member::Member;
use serde::{Deserialize, Serialize};

/// Per-member classification over two consecutive weekly snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LapseState {
    /// No record in either week.
    Unknown,
    /// Present in the current week.
    StillPresent,
    /// Present last week, absent or unrecorded this week.
    NewlyAbsent,
    /// Not present in either week, with at least one explicit record.
    ChronicAbsent,
}

/// Why a member was placed on the call list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum CallReason {
    AbsentThisWeek,
}

impl CallReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AbsentThisWeek => "absent_this_week",
        }
    }
}

/// Member flagged for pastoral follow-up contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallTarget {
    pub member: Member,
    pub reason: CallReason,
}

/// One day of the attendance trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub date: AttendanceDate,
    pub present_count: u32,
    pub absent_count: u32,
    pub total_count: u32,
    pub percentage: u32,
}

/// Present/absent counts for one date against a population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub present: u32,
    pub absent: u32,
    pub percentage: u32,
}
