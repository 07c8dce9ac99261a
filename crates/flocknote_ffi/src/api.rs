//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose attendance, follow-up and roster-cache use cases to Dart via FRB.
//! - Translate core errors into envelopes the UI can render directly.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - `ok=true` with empty `items` means "no data for this period";
//!   `ok=false` means "failed to load" and the UI offers a retry.
//! - Dates cross the boundary as `YYYY-MM-DD` strings only.

use flocknote_core::db::open_db;
use flocknote_core::{
    compute_call_list, compute_history, core_version as core_version_inner,
    init_logging as init_logging_inner, ping as ping_inner, AttendanceDate, AttendanceEntry,
    AttendanceLedger, AttendanceRecord, AttendanceService, AttendanceValidationError, CallTarget,
    FollowUpError, HistoryPoint, InFlightWrites, Member, Presence, RosterProvider,
    SqliteAttendanceLedger, SqliteRosterRepository,
};
use log::warn;
use rusqlite::Connection;
use std::path::PathBuf;
use std::sync::OnceLock;

const DB_PATH_ENV: &str = "FLOCKNOTE_DB_PATH";
const DB_FILE_NAME: &str = "flocknote_attendance.sqlite3";
static DB_PATH: OnceLock<PathBuf> = OnceLock::new();
static IN_FLIGHT_WRITES: OnceLock<InFlightWrites> = OnceLock::new();

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// One member mark submitted from the attendance screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceMark {
    pub member_id: String,
    pub present: bool,
    pub notes: Option<String>,
}

/// Attendance record as rendered by list screens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceItem {
    pub member_id: String,
    /// `YYYY-MM-DD`.
    pub sunday_date: String,
    pub present: bool,
    pub notes: Option<String>,
}

/// Envelope for record lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttendanceListResponse {
    pub ok: bool,
    pub items: Vec<AttendanceItem>,
    pub message: String,
}

/// Envelope for a single member/date lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceResponse {
    pub ok: bool,
    /// `present|absent|unknown`; empty when `ok=false`.
    pub presence: String,
    pub notes: Option<String>,
    pub message: String,
}

/// Envelope for dashboard counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryResponse {
    pub ok: bool,
    pub present: u32,
    pub absent: u32,
    pub percentage: u32,
    pub message: String,
}

/// Call-list row with display metadata passed through from the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallTargetItem {
    pub member_id: String,
    pub display_name: String,
    pub phone_primary: Option<String>,
    pub area_id: Option<String>,
    pub leader_id: Option<String>,
    /// Stable reason code, e.g. `absent_this_week`.
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallListResponse {
    pub ok: bool,
    pub items: Vec<CallTargetItem>,
    /// Sunday the list was computed for.
    pub week: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryItem {
    pub date: String,
    pub present_count: u32,
    pub absent_count: u32,
    pub total_count: u32,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryResponse {
    pub ok: bool,
    /// Newest first.
    pub items: Vec<HistoryItem>,
    pub message: String,
}

/// Member row synced from the remote roster service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterMemberInput {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_primary: Option<String>,
    pub is_active: bool,
    pub area_id: Option<String>,
    pub leader_id: Option<String>,
}

/// Generic action response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResponse {
    pub ok: bool,
    pub id: Option<String>,
    pub message: String,
}

/// Records a week of attendance marks and returns the stored snapshot.
///
/// # FFI contract
/// - Sync call, DB-backed execution.
/// - A second call for the same date while one is pending fails fast.
/// - On failure nothing is written; retrying the same batch is safe.
#[flutter_rust_bridge::frb(sync)]
pub fn attendance_record_week(
    sunday_date: String,
    marks: Vec<AttendanceMark>,
) -> AttendanceListResponse {
    let result = parse_date(&sunday_date).and_then(|date| {
        let entries: Vec<AttendanceEntry> = marks
            .into_iter()
            .map(|mark| AttendanceEntry {
                member_id: mark.member_id,
                present: mark.present,
                notes: mark.notes,
            })
            .collect();
        with_connection(|conn| {
            let ledger = SqliteAttendanceLedger::try_new(conn)?;
            let mut service = AttendanceService::new(ledger);
            service.record_week_guarded(in_flight_writes(), date, &entries)
        })
    });

    match result {
        Ok(records) => list_response(records, "Attendance saved."),
        Err(err) => list_failure(format!("attendance_record_week failed: {err}")),
    }
}

/// Lists every record for one date.
#[flutter_rust_bridge::frb(sync)]
pub fn attendance_for_date(sunday_date: String) -> AttendanceListResponse {
    let result = parse_date(&sunday_date).and_then(|date| {
        with_connection(|conn| SqliteAttendanceLedger::try_new(conn)?.get_by_date(date))
    });

    match result {
        Ok(records) => list_response(records, "No attendance recorded for this date."),
        Err(err) => list_failure(format!("attendance_for_date failed: {err}")),
    }
}

/// Looks up one member/date pair, reporting `unknown` when unrecorded.
#[flutter_rust_bridge::frb(sync)]
pub fn attendance_for_member(member_id: String, sunday_date: String) -> PresenceResponse {
    let result = parse_date(&sunday_date).and_then(|date| {
        with_connection(|conn| {
            SqliteAttendanceLedger::try_new(conn)?.get_by_member(member_id.as_str(), date)
        })
    });

    match result {
        Ok(record) => {
            let presence = Presence::from_record(record.as_ref());
            PresenceResponse {
                ok: true,
                presence: presence.as_str().to_string(),
                notes: record.and_then(|record| record.notes),
                message: String::new(),
            }
        }
        Err(err) => PresenceResponse {
            ok: false,
            presence: String::new(),
            notes: None,
            message: format!("attendance_for_member failed: {err}"),
        },
    }
}

/// Present/absent counts for one date against the roster size.
#[flutter_rust_bridge::frb(sync)]
pub fn attendance_summary(sunday_date: String, total_population: u32) -> SummaryResponse {
    let result = parse_date(&sunday_date).and_then(|date| {
        with_connection(|conn| {
            let service = AttendanceService::new(SqliteAttendanceLedger::try_new(conn)?);
            service.summary_for(date, total_population)
        })
    });

    match result {
        Ok(summary) => SummaryResponse {
            ok: true,
            present: summary.present,
            absent: summary.absent,
            percentage: summary.percentage,
            message: String::new(),
        },
        Err(err) => SummaryResponse {
            ok: false,
            present: 0,
            absent: 0,
            percentage: 0,
            message: format!("attendance_summary failed: {err}"),
        },
    }
}

/// Derives the follow-up call list from the cached roster.
///
/// Input semantics:
/// - `today`: `YYYY-MM-DD`, or empty for the device's current date.
#[flutter_rust_bridge::frb(sync)]
pub fn follow_up_call_list(today: String) -> CallListResponse {
    let today = if today.trim().is_empty() {
        Ok(AttendanceDate::today())
    } else {
        parse_date(&today)
    };
    let week = today
        .as_ref()
        .map(|date| date.most_recent_sunday().to_key())
        .unwrap_or_default();

    let result = today.and_then(|today| {
        with_connection(|conn| {
            let roster = SqliteRosterRepository::try_new(conn)
                .and_then(|repo| repo.list_members())
                .map_err(FollowUpError::Roster)?;
            let ledger = SqliteAttendanceLedger::try_new(conn)?;
            compute_call_list(today, &roster, &ledger)
        })
    });

    match result {
        Ok(targets) => {
            let message = if targets.is_empty() {
                "Nobody needs a call this week.".to_string()
            } else {
                format!("{} member(s) to call.", targets.len())
            };
            CallListResponse {
                ok: true,
                items: targets.into_iter().map(to_call_target_item).collect(),
                week,
                message,
            }
        }
        Err(err) => CallListResponse {
            ok: false,
            items: Vec::new(),
            week,
            message: format!("follow_up_call_list failed: {err}"),
        },
    }
}

/// Daily attendance trend for reporting screens.
#[flutter_rust_bridge::frb(sync)]
pub fn attendance_history(center_date: String, window_days: u32) -> HistoryResponse {
    let result = parse_date(&center_date).and_then(|center| {
        with_connection(|conn| {
            let ledger = SqliteAttendanceLedger::try_new(conn).map_err(FollowUpError::from)?;
            compute_history(center, window_days, &ledger)
        })
    });

    match result {
        Ok(points) => {
            let message = if points.is_empty() {
                "No attendance recorded in this period.".to_string()
            } else {
                String::new()
            };
            HistoryResponse {
                ok: true,
                items: points.into_iter().map(to_history_item).collect(),
                message,
            }
        }
        Err(err) => HistoryResponse {
            ok: false,
            items: Vec::new(),
            message: format!("attendance_history failed: {err}"),
        },
    }
}

/// Inserts or replaces one member in the local roster cache.
#[flutter_rust_bridge::frb(sync)]
pub fn roster_upsert_member(member: RosterMemberInput) -> ActionResponse {
    let member = Member {
        id: member.id,
        first_name: member.first_name,
        last_name: member.last_name,
        phone_primary: member.phone_primary,
        is_active: member.is_active,
        area_id: member.area_id,
        leader_id: member.leader_id,
    };

    match with_connection(|conn| SqliteRosterRepository::try_new(conn)?.upsert_member(&member)) {
        Ok(id) => ActionResponse {
            ok: true,
            id: Some(id),
            message: "Member saved.".to_string(),
        },
        Err(err) => ActionResponse {
            ok: false,
            id: None,
            message: format!("roster_upsert_member failed: {err}"),
        },
    }
}

fn parse_date(value: &str) -> Result<AttendanceDate, String> {
    AttendanceDate::parse(value).map_err(|err: AttendanceValidationError| err.to_string())
}

fn resolve_db_path() -> PathBuf {
    DB_PATH
        .get_or_init(|| {
            if let Ok(raw) = std::env::var(DB_PATH_ENV) {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    return PathBuf::from(trimmed);
                }
            }
            std::env::temp_dir().join(DB_FILE_NAME)
        })
        .clone()
}

fn in_flight_writes() -> &'static InFlightWrites {
    IN_FLIGHT_WRITES.get_or_init(InFlightWrites::new)
}

fn with_connection<T, E: std::fmt::Display>(
    f: impl FnOnce(&Connection) -> Result<T, E>,
) -> Result<T, String> {
    let conn = open_db(resolve_db_path()).map_err(|err| {
        warn!("event=ffi_db_open module=ffi status=error error={err}");
        format!("database open failed: {err}")
    })?;
    f(&conn).map_err(|err| err.to_string())
}

fn list_response(records: Vec<AttendanceRecord>, empty_message: &str) -> AttendanceListResponse {
    let message = if records.is_empty() {
        empty_message.to_string()
    } else {
        format!("{} record(s).", records.len())
    };
    AttendanceListResponse {
        ok: true,
        items: records.into_iter().map(to_attendance_item).collect(),
        message,
    }
}

fn list_failure(message: String) -> AttendanceListResponse {
    AttendanceListResponse {
        ok: false,
        items: Vec::new(),
        message,
    }
}

fn to_attendance_item(record: AttendanceRecord) -> AttendanceItem {
    AttendanceItem {
        member_id: record.member_id,
        sunday_date: record.sunday_date.to_key(),
        present: record.present,
        notes: record.notes,
    }
}

fn to_call_target_item(target: CallTarget) -> CallTargetItem {
    CallTargetItem {
        display_name: target.member.display_name(),
        member_id: target.member.id,
        phone_primary: target.member.phone_primary,
        area_id: target.member.area_id,
        leader_id: target.member.leader_id,
        reason: target.reason.as_str().to_string(),
    }
}

fn to_history_item(point: HistoryPoint) -> HistoryItem {
    HistoryItem {
        date: point.date.to_key(),
        present_count: point.present_count,
        absent_count: point.absent_count,
        total_count: point.total_count,
        percentage: point.percentage,
    }
}
