//! Attendance ledger contract and SQLite implementation.
//!
//! # Responsibility
//! - Own the canonical set of `(member_id, sunday_date)` presence facts.
//! - Provide idempotent bulk upsert plus point and range reads.
//!
//! # Invariants
//! - Every entry in a batch is validated before the first SQL mutation.
//! - A batch is applied in one immediate transaction: all or nothing.
//! - Reads return empty results for missing data; they never raise not-found.
//! - Read paths reject invalid persisted state instead of masking it.

use crate::db::DbError;
use crate::model::attendance::{
    AttendanceEntry, AttendanceRecord, AttendanceValidationError, Presence,
};
use crate::model::date::AttendanceDate;
use log::{debug, error, info};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const ATTENDANCE_SELECT_SQL: &str = "SELECT
    member_id,
    sunday_date,
    present,
    notes
FROM attendance";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for ledger and roster persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Input rejected before touching storage.
    Validation(AttendanceValidationError),
    /// Storage failure. Safe to retry: ledger writes are idempotent.
    Db(DbError),
    /// Persisted row could not be decoded.
    InvalidData(String),
    /// Another write for the same date has not finished yet.
    WriteInProgress(AttendanceDate),
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::WriteInProgress(date) => {
                write!(f, "attendance write for {date} is already in progress")
            }
            Self::MissingRequiredTable(table) => {
                write!(f, "connection is missing required table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "table `{table}` is missing required column `{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl RepoError {
    /// Whether retrying the same call verbatim can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Db(_) | Self::WriteInProgress(_))
    }
}

impl From<AttendanceValidationError> for RepoError {
    fn from(value: AttendanceValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Ledger interface shared by the attendance screen, stats and the
/// follow-up engine.
pub trait AttendanceLedger {
    /// Inserts or replaces one record per entry for `sunday_date`.
    ///
    /// Entries need not cover the full roster. When a batch names the same
    /// member twice, the later entry wins.
    fn upsert_many(
        &mut self,
        sunday_date: AttendanceDate,
        entries: &[AttendanceEntry],
    ) -> RepoResult<()>;

    /// Returns every record for the date. Order is not part of the contract.
    fn get_by_date(&self, sunday_date: AttendanceDate) -> RepoResult<Vec<AttendanceRecord>>;

    /// Returns the record for one member/date pair, `None` when unknown.
    fn get_by_member(
        &self,
        member_id: &str,
        sunday_date: AttendanceDate,
    ) -> RepoResult<Option<AttendanceRecord>>;

    /// Returns records with `start <= sunday_date <= end`, newest first.
    fn get_range(
        &self,
        start: AttendanceDate,
        end: AttendanceDate,
    ) -> RepoResult<Vec<AttendanceRecord>>;

    /// Tri-state presence for one member/date pair.
    fn presence_of(&self, member_id: &str, sunday_date: AttendanceDate) -> RepoResult<Presence> {
        let record = self.get_by_member(member_id, sunday_date)?;
        Ok(Presence::from_record(record.as_ref()))
    }
}

/// SQLite-backed attendance ledger.
pub struct SqliteAttendanceLedger<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAttendanceLedger<'conn> {
    /// Constructs a ledger from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_table_ready(
            conn,
            "attendance",
            &["member_id", "sunday_date", "present", "notes"],
        )?;
        Ok(Self { conn })
    }
}

impl AttendanceLedger for SqliteAttendanceLedger<'_> {
    fn upsert_many(
        &mut self,
        sunday_date: AttendanceDate,
        entries: &[AttendanceEntry],
    ) -> RepoResult<()> {
        for entry in entries {
            entry.validate()?;
        }

        if entries.is_empty() {
            debug!("event=attendance_upsert module=ledger status=skip date={sunday_date} entries=0");
            return Ok(());
        }

        let started_at = Instant::now();
        let date_key = sunday_date.to_key();
        match write_batch(self.conn, &date_key, entries) {
            Ok(()) => {
                info!(
                    "event=attendance_upsert module=ledger status=ok date={} entries={} duration_ms={}",
                    date_key,
                    entries.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(())
            }
            Err(err) => {
                let error_code = match &err {
                    RepoError::Db(db_err) if db_err.is_busy() => "db_busy",
                    _ => "db_write_failed",
                };
                error!(
                    "event=attendance_upsert module=ledger status=error date={} entries={} duration_ms={} error_code={} error={}",
                    date_key,
                    entries.len(),
                    started_at.elapsed().as_millis(),
                    error_code,
                    err
                );
                Err(err)
            }
        }
    }

    fn get_by_date(&self, sunday_date: AttendanceDate) -> RepoResult<Vec<AttendanceRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ATTENDANCE_SELECT_SQL}
             WHERE sunday_date = ?1
             ORDER BY member_id ASC;"
        ))?;

        let mut rows = stmt.query([sunday_date.to_key()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_attendance_row(row)?);
        }

        Ok(records)
    }

    fn get_by_member(
        &self,
        member_id: &str,
        sunday_date: AttendanceDate,
    ) -> RepoResult<Option<AttendanceRecord>> {
        let member_id = member_id.trim();
        if member_id.is_empty() {
            return Err(AttendanceValidationError::BlankMemberId.into());
        }

        let mut stmt = self.conn.prepare(&format!(
            "{ATTENDANCE_SELECT_SQL}
             WHERE member_id = ?1
               AND sunday_date = ?2;"
        ))?;

        let mut rows = stmt.query(params![member_id, sunday_date.to_key()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_attendance_row(row)?));
        }

        Ok(None)
    }

    fn get_range(
        &self,
        start: AttendanceDate,
        end: AttendanceDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        if start > end {
            return Err(AttendanceValidationError::InvalidRange { start, end }.into());
        }

        // Canonical keys are zero-padded, so text order equals date order.
        let mut stmt = self.conn.prepare(&format!(
            "{ATTENDANCE_SELECT_SQL}
             WHERE sunday_date BETWEEN ?1 AND ?2
             ORDER BY sunday_date DESC, member_id ASC;"
        ))?;

        let mut rows = stmt.query(params![start.to_key(), end.to_key()])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            records.push(parse_attendance_row(row)?);
        }

        Ok(records)
    }
}

fn write_batch(conn: &Connection, date_key: &str, entries: &[AttendanceEntry]) -> RepoResult<()> {
    // Connection is shared with readers; SQLite rejects a nested BEGIN.
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    {
        let mut stmt = tx.prepare(
            "INSERT INTO attendance (member_id, sunday_date, present, notes)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (member_id, sunday_date) DO UPDATE SET
                present = excluded.present,
                notes = excluded.notes,
                updated_at = (strftime('%s', 'now') * 1000);",
        )?;

        for entry in entries {
            let (member_id, notes) = entry.normalized();
            stmt.execute(params![
                member_id,
                date_key,
                bool_to_int(entry.present),
                notes
            ])?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn parse_attendance_row(row: &Row<'_>) -> RepoResult<AttendanceRecord> {
    let date_text: String = row.get("sunday_date")?;
    let sunday_date = AttendanceDate::parse(&date_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid date value `{date_text}` in attendance.sunday_date"
        ))
    })?;

    let present = match row.get::<_, i64>("present")? {
        0 => false,
        1 => true,
        other => {
            return Err(RepoError::InvalidData(format!(
                "invalid present value `{other}` in attendance.present"
            )));
        }
    };

    Ok(AttendanceRecord {
        member_id: row.get("member_id")?,
        sunday_date,
        present,
        notes: row.get("notes")?,
    })
}

/// Verifies a table and its required columns exist on the connection.
pub(crate) fn ensure_table_ready(
    conn: &Connection,
    table: &'static str,
    columns: &[&'static str],
) -> RepoResult<()> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    if exists != 1 {
        return Err(RepoError::MissingRequiredTable(table));
    }

    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    let mut present_columns = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        present_columns.push(name);
    }

    for &column in columns {
        if !present_columns.iter().any(|name| name.as_str() == column) {
            return Err(RepoError::MissingRequiredColumn { table, column });
        }
    }

    Ok(())
}

pub(crate) fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
