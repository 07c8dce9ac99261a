//! Present/absent aggregation shared by dashboards and history views.
//!
//! # Invariants
//! - Percentages are rounded half up to the nearest integer.
//! - A zero denominator yields 0%, never a division fault.

use crate::model::attendance::AttendanceRecord;
use crate::model::date::AttendanceDate;
use crate::model::follow_up::{AttendanceSummary, HistoryPoint};
use crate::repo::attendance_repo::{AttendanceLedger, RepoResult};

/// Summarizes records against the full population for one date.
///
/// Members without a record count toward `absent` and the denominator but
/// never toward `present`.
pub fn summarize(records: &[AttendanceRecord], total_population: u32) -> AttendanceSummary {
    let present = count_present(records);
    AttendanceSummary {
        present,
        absent: total_population.saturating_sub(present),
        percentage: rounded_percentage(present, total_population),
    }
}

/// Reads one date from the ledger and summarizes it.
pub fn summarize_date<L: AttendanceLedger + ?Sized>(
    ledger: &L,
    date: AttendanceDate,
    total_population: u32,
) -> RepoResult<AttendanceSummary> {
    let records = ledger.get_by_date(date)?;
    Ok(summarize(&records, total_population))
}

/// Builds a trend point from the records of one date.
///
/// Returns `None` when there are no records, so empty days are omitted
/// rather than reported as 0%.
pub fn history_point(date: AttendanceDate, records: &[AttendanceRecord]) -> Option<HistoryPoint> {
    if records.is_empty() {
        return None;
    }

    let total_count = u32::try_from(records.len()).unwrap_or(u32::MAX);
    let present_count = count_present(records);
    Some(HistoryPoint {
        date,
        present_count,
        absent_count: total_count - present_count,
        total_count,
        percentage: rounded_percentage(present_count, total_count),
    })
}

/// `round(part / whole * 100)` with half-up rounding, 0 when `whole == 0`.
pub fn rounded_percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let part = u64::from(part);
    let whole = u64::from(whole);
    let value = (part * 200 + whole) / (whole * 2);
    u32::try_from(value).unwrap_or(u32::MAX)
}

fn count_present(records: &[AttendanceRecord]) -> u32 {
    let count = records.iter().filter(|record| record.present).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{history_point, rounded_percentage, summarize};
    use crate::model::attendance::AttendanceRecord;
    use crate::model::date::AttendanceDate;
    use crate::model::follow_up::AttendanceSummary;

    fn record(member_id: &str, present: bool) -> AttendanceRecord {
        AttendanceRecord {
            member_id: member_id.to_string(),
            sunday_date: AttendanceDate::parse("2024-03-10").unwrap(),
            present,
            notes: None,
        }
    }

    #[test]
    fn summarize_empty_population_has_no_division_fault() {
        assert_eq!(summarize(&[], 0), AttendanceSummary::default());
    }

    #[test]
    fn summarize_counts_unmarked_members_as_absent() {
        let records = vec![record("a", true), record("b", false)];
        let summary = summarize(&records, 4);
        assert_eq!(summary.present, 1);
        assert_eq!(summary.absent, 3);
        assert_eq!(summary.percentage, 25);
    }

    #[test]
    fn rounded_percentage_rounds_half_up() {
        assert_eq!(rounded_percentage(1, 3), 33);
        assert_eq!(rounded_percentage(2, 3), 67);
        assert_eq!(rounded_percentage(1, 8), 13);
        assert_eq!(rounded_percentage(5, 5), 100);
    }

    #[test]
    fn history_point_is_none_for_empty_day() {
        let date = AttendanceDate::parse("2024-03-10").unwrap();
        assert!(history_point(date, &[]).is_none());

        let point = history_point(date, &[record("a", true), record("b", false)]).unwrap();
        assert_eq!(point.total_count, 2);
        assert_eq!(point.absent_count, 1);
        assert_eq!(point.percentage, 50);
    }
}
