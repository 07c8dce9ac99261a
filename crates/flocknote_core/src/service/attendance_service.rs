//! Attendance use-case service.
//!
//! # Responsibility
//! - Provide the weekly marking flow used by the attendance screen.
//! - Delegate persistence to any `AttendanceLedger` implementation.
//!
//! # Invariants
//! - Service APIs never bypass ledger validation/upsert contracts.
//! - A rejected or failed write leaves the previous ledger state visible.

use crate::model::attendance::{AttendanceEntry, AttendanceRecord, Presence};
use crate::model::date::AttendanceDate;
use crate::model::follow_up::AttendanceSummary;
use crate::repo::attendance_repo::{AttendanceLedger, RepoResult};
use crate::service::stats::summarize_date;
use crate::service::write_guard::InFlightWrites;

/// Use-case service wrapper for ledger operations.
pub struct AttendanceService<L: AttendanceLedger> {
    ledger: L,
}

impl<L: AttendanceLedger> AttendanceService<L> {
    /// Creates a service using the provided ledger implementation.
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    /// Records one week of marks and returns the resulting date snapshot.
    pub fn record_week(
        &mut self,
        sunday_date: AttendanceDate,
        entries: &[AttendanceEntry],
    ) -> RepoResult<Vec<AttendanceRecord>> {
        self.ledger.upsert_many(sunday_date, entries)?;
        self.ledger.get_by_date(sunday_date)
    }

    /// Same as [`Self::record_week`], rejecting overlapping writes for the
    /// same date tracked by `writes`.
    pub fn record_week_guarded(
        &mut self,
        writes: &InFlightWrites,
        sunday_date: AttendanceDate,
        entries: &[AttendanceEntry],
    ) -> RepoResult<Vec<AttendanceRecord>> {
        let _slot = writes.begin(sunday_date)?;
        self.record_week(sunday_date, entries)
    }

    pub fn records_for(&self, sunday_date: AttendanceDate) -> RepoResult<Vec<AttendanceRecord>> {
        self.ledger.get_by_date(sunday_date)
    }

    pub fn member_record(
        &self,
        member_id: &str,
        sunday_date: AttendanceDate,
    ) -> RepoResult<Option<AttendanceRecord>> {
        self.ledger.get_by_member(member_id, sunday_date)
    }

    pub fn presence_of(&self, member_id: &str, sunday_date: AttendanceDate) -> RepoResult<Presence> {
        self.ledger.presence_of(member_id, sunday_date)
    }

    pub fn records_between(
        &self,
        start: AttendanceDate,
        end: AttendanceDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        self.ledger.get_range(start, end)
    }

    /// Dashboard counts for one date against the roster size.
    pub fn summary_for(
        &self,
        sunday_date: AttendanceDate,
        total_population: u32,
    ) -> RepoResult<AttendanceSummary> {
        summarize_date(&self.ledger, sunday_date, total_population)
    }

    /// Returns the wrapped ledger for read-only derivations.
    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn into_ledger(self) -> L {
        self.ledger
    }
}
