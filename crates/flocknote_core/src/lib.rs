//! Core attendance logic for FlockNote.
//! This crate is the single source of truth for attendance invariants and
//! follow-up targeting.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status};
pub use model::attendance::{
    AttendanceEntry, AttendanceRecord, AttendanceValidationError, Presence,
};
pub use model::date::AttendanceDate;
pub use model::follow_up::{AttendanceSummary, CallReason, CallTarget, HistoryPoint, LapseState};
pub use model::member::{Member, MemberId};
pub use repo::attendance_repo::{AttendanceLedger, RepoError, RepoResult, SqliteAttendanceLedger};
pub use repo::roster_repo::{RosterProvider, SqliteRosterRepository};
pub use service::attendance_service::AttendanceService;
pub use service::follow_up_service::{
    classify, compute_call_list, compute_history, FollowUpError, FollowUpService,
    MAX_HISTORY_WINDOW_DAYS,
};
pub use service::stats::{history_point, summarize, summarize_date};
pub use service::write_guard::{InFlightWrites, WriteSlot};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
