use flocknote_core::db::open_db_in_memory;
use flocknote_core::{
    compute_call_list, compute_history, AttendanceDate, AttendanceEntry, AttendanceLedger,
    AttendanceRecord, AttendanceValidationError, CallReason, FollowUpError, FollowUpService,
    LapseState, Member, RepoError, RepoResult, RosterProvider, SqliteAttendanceLedger,
    SqliteRosterRepository, MAX_HISTORY_WINDOW_DAYS,
};
use std::cell::Cell;

const PREVIOUS_SUNDAY: &str = "2024-03-03";
const CURRENT_SUNDAY: &str = "2024-03-10";

fn date(value: &str) -> AttendanceDate {
    AttendanceDate::parse(value).unwrap()
}

fn member_ids(targets: &[flocknote_core::CallTarget]) -> Vec<&str> {
    targets.iter().map(|t| t.member.id.as_str()).collect()
}

/// Ledger whose reads fail after a configurable number of successes.
struct FailingLedger {
    reads_before_failure: Cell<u32>,
}

impl AttendanceLedger for FailingLedger {
    fn upsert_many(&mut self, _: AttendanceDate, _: &[AttendanceEntry]) -> RepoResult<()> {
        Ok(())
    }

    fn get_by_date(&self, _: AttendanceDate) -> RepoResult<Vec<AttendanceRecord>> {
        let remaining = self.reads_before_failure.get();
        if remaining == 0 {
            return Err(RepoError::Db(flocknote_core::db::DbError::Sqlite(
                rusqlite::Error::InvalidQuery,
            )));
        }
        self.reads_before_failure.set(remaining - 1);
        Ok(Vec::new())
    }

    fn get_by_member(&self, _: &str, _: AttendanceDate) -> RepoResult<Option<AttendanceRecord>> {
        Ok(None)
    }

    fn get_range(
        &self,
        _: AttendanceDate,
        _: AttendanceDate,
    ) -> RepoResult<Vec<AttendanceRecord>> {
        Ok(Vec::new())
    }
}

struct FailingRoster;

impl RosterProvider for FailingRoster {
    fn list_members(&self) -> RepoResult<Vec<Member>> {
        Err(RepoError::InvalidData("roster unavailable".to_string()))
    }
}

#[test]
fn lapse_detection_flags_only_members_present_last_week() {
    let conn = open_db_in_memory().unwrap();
    let mut ledger = SqliteAttendanceLedger::try_new(&conn).unwrap();
    ledger
        .upsert_many(
            date(PREVIOUS_SUNDAY),
            &[
                AttendanceEntry::new("A", true),
                AttendanceEntry::new("B", false),
            ],
        )
        .unwrap();
    ledger
        .upsert_many(date(CURRENT_SUNDAY), &[AttendanceEntry::new("A", false)])
        .unwrap();

    let roster = vec![Member::new("A", "Ana", "Ruiz"), Member::new("B", "Ben", "Ortiz")];
    let targets = compute_call_list(date(CURRENT_SUNDAY), &roster, &ledger).unwrap();

    assert_eq!(member_ids(&targets), vec!["A"]);
    assert_eq!(targets[0].reason, CallReason::AbsentThisWeek);
}

#[test]
fn end_to_end_inactive_members_never_appear() {
    let conn = open_db_in_memory().unwrap();
    let mut ledger = SqliteAttendanceLedger::try_new(&conn).unwrap();
    ledger
        .upsert_many(
            date(PREVIOUS_SUNDAY),
            &[
                AttendanceEntry::new("A", true),
                AttendanceEntry::new("B", true),
                AttendanceEntry::new("C", true),
            ],
        )
        .unwrap();
    ledger
        .upsert_many(date(CURRENT_SUNDAY), &[AttendanceEntry::new("A", true)])
        .unwrap();

    let roster = vec![
        Member::new("A", "Ana", "Ruiz"),
        Member::new("B", "Ben", "Ortiz"),
        Member::new("C", "Cora", "Diaz").inactive(),
    ];
    let targets = compute_call_list(date(CURRENT_SUNDAY), &roster, &ledger).unwrap();

    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].member, roster[1]);
    assert_eq!(targets[0].reason, CallReason::AbsentThisWeek);
}

#[test]
fn members_without_records_in_either_week_are_excluded() {
    let conn = open_db_in_memory().unwrap();
    let ledger = SqliteAttendanceLedger::try_new(&conn).unwrap();

    let roster = vec![Member::new("ghost", "Gil", "Reyes")];
    let targets = compute_call_list(date(CURRENT_SUNDAY), &roster, &ledger).unwrap();
    assert!(targets.is_empty());
}

#[test]
fn call_list_uses_most_recent_sunday_for_midweek_today() {
    let conn = open_db_in_memory().unwrap();
    let mut ledger = SqliteAttendanceLedger::try_new(&conn).unwrap();
    ledger
        .upsert_many(date(PREVIOUS_SUNDAY), &[AttendanceEntry::new("A", true)])
        .unwrap();

    let roster = vec![Member::new("A", "Ana", "Ruiz")];
    let thursday = date("2024-03-14");
    let targets = compute_call_list(thursday, &roster, &ledger).unwrap();
    assert_eq!(member_ids(&targets), vec!["A"]);

    let next_sunday = date("2024-03-17");
    assert!(compute_call_list(next_sunday, &roster, &ledger)
        .unwrap()
        .is_empty());
}

#[test]
fn call_list_preserves_roster_order() {
    let conn = open_db_in_memory().unwrap();
    let mut ledger = SqliteAttendanceLedger::try_new(&conn).unwrap();
    let entries: Vec<_> = ["z", "a", "m"]
        .iter()
        .map(|id| AttendanceEntry::new(*id, true))
        .collect();
    ledger.upsert_many(date(PREVIOUS_SUNDAY), &entries).unwrap();

    let roster = vec![
        Member::new("z", "Zoe", "Z"),
        Member::new("a", "Abe", "A"),
        Member::new("m", "Mia", "M"),
    ];
    let targets = compute_call_list(date(CURRENT_SUNDAY), &roster, &ledger).unwrap();
    assert_eq!(member_ids(&targets), vec!["z", "a", "m"]);
}

#[test]
fn failed_read_aborts_call_list_instead_of_returning_empty() {
    let roster = vec![Member::new("A", "Ana", "Ruiz")];
    for successes in [0, 1] {
        let ledger = FailingLedger {
            reads_before_failure: Cell::new(successes),
        };
        let err = compute_call_list(date(CURRENT_SUNDAY), &roster, &ledger).unwrap_err();
        assert!(matches!(err, FollowUpError::Ledger(_)));
    }
}

#[test]
fn history_omits_days_without_records_and_is_newest_first() {
    let conn = open_db_in_memory().unwrap();
    let mut ledger = SqliteAttendanceLedger::try_new(&conn).unwrap();
    ledger
        .upsert_many(
            date("2024-03-10"),
            &[
                AttendanceEntry::new("A", true),
                AttendanceEntry::new("B", false),
            ],
        )
        .unwrap();
    ledger
        .upsert_many(date("2024-03-06"), &[AttendanceEntry::new("A", true)])
        .unwrap();
    ledger
        .upsert_many(date("2024-02-01"), &[AttendanceEntry::new("A", true)])
        .unwrap();

    let points = compute_history(date("2024-03-10"), 30, &ledger).unwrap();
    let dates: Vec<String> = points.iter().map(|p| p.date.to_key()).collect();
    assert_eq!(dates, vec!["2024-03-10", "2024-03-06"]);

    assert_eq!(points[0].present_count, 1);
    assert_eq!(points[0].absent_count, 1);
    assert_eq!(points[0].total_count, 2);
    assert_eq!(points[0].percentage, 50);
    assert_eq!(points[1].percentage, 100);
}

#[test]
fn history_window_bounds() {
    let conn = open_db_in_memory().unwrap();
    let ledger = SqliteAttendanceLedger::try_new(&conn).unwrap();

    assert!(compute_history(date("2024-03-10"), 0, &ledger)
        .unwrap()
        .is_empty());

    let err = compute_history(date("2024-03-10"), MAX_HISTORY_WINDOW_DAYS + 1, &ledger)
        .unwrap_err();
    assert!(matches!(
        err,
        FollowUpError::Validation(AttendanceValidationError::InvalidWindow { .. })
    ));
}

#[test]
fn history_propagates_read_failures() {
    let ledger = FailingLedger {
        reads_before_failure: Cell::new(3),
    };
    let err = compute_history(date("2024-03-10"), 30, &ledger).unwrap_err();
    assert!(matches!(err, FollowUpError::Ledger(_)));
}

#[test]
fn follow_up_service_reads_roster_from_sqlite_cache() {
    let conn = open_db_in_memory().unwrap();
    let roster = SqliteRosterRepository::try_new(&conn).unwrap();
    roster.upsert_member(&Member::new("A", "Ana", "Ruiz")).unwrap();
    roster
        .upsert_member(&Member::new("B", "Ben", "Ortiz").inactive())
        .unwrap();

    let mut ledger = SqliteAttendanceLedger::try_new(&conn).unwrap();
    ledger
        .upsert_many(
            date(PREVIOUS_SUNDAY),
            &[
                AttendanceEntry::new("A", true),
                AttendanceEntry::new("B", true),
            ],
        )
        .unwrap();

    let service = FollowUpService::new(ledger, roster);
    let targets = service.call_list(date(CURRENT_SUNDAY)).unwrap();
    assert_eq!(member_ids(&targets), vec!["A"]);

    let states = service.lapse_states(date(CURRENT_SUNDAY)).unwrap();
    assert_eq!(states.len(), 1);
    assert_eq!(states[0].1, LapseState::NewlyAbsent);
}

#[test]
fn follow_up_service_accepts_in_memory_roster() {
    let conn = open_db_in_memory().unwrap();
    let mut ledger = SqliteAttendanceLedger::try_new(&conn).unwrap();
    ledger
        .upsert_many(date(CURRENT_SUNDAY), &[AttendanceEntry::new("A", true)])
        .unwrap();

    let roster = vec![Member::new("A", "Ana", "Ruiz"), Member::new("B", "Ben", "Ortiz")];
    let service = FollowUpService::new(ledger, roster);

    assert!(service.call_list(date(CURRENT_SUNDAY)).unwrap().is_empty());
    let states = service.lapse_states(date(CURRENT_SUNDAY)).unwrap();
    assert_eq!(states[0].1, LapseState::StillPresent);
    assert_eq!(states[1].1, LapseState::Unknown);

    let history = service.history(date(CURRENT_SUNDAY), 7).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].percentage, 100);
}

#[test]
fn follow_up_service_surfaces_roster_failures() {
    let conn = open_db_in_memory().unwrap();
    let ledger = SqliteAttendanceLedger::try_new(&conn).unwrap();
    let service = FollowUpService::new(ledger, FailingRoster);

    let err = service.call_list(date(CURRENT_SUNDAY)).unwrap_err();
    assert!(matches!(err, FollowUpError::Roster(_)));
}
