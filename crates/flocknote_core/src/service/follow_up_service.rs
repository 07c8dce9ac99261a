//! Follow-up targeting engine.
//!
//! # Responsibility
//! - Classify members across two consecutive weekly snapshots.
//! - Derive the pastoral call list and the daily attendance trend.
//!
//! # Invariants
//! - Only active roster members are considered; ledger rows for members
//!   outside the roster are ignored.
//! - Explicit `present=false` and a missing record classify identically.
//! - A failed ledger or roster read aborts the derivation; it is never
//!   reported as an empty result.

use crate::model::attendance::{AttendanceRecord, AttendanceValidationError, Presence};
use crate::model::date::AttendanceDate;
use crate::model::follow_up::{CallReason, CallTarget, HistoryPoint, LapseState};
use crate::model::member::Member;
use crate::repo::attendance_repo::{AttendanceLedger, RepoError};
use crate::repo::roster_repo::RosterProvider;
use crate::service::stats::history_point;
use log::{error, info};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Largest trailing window accepted by [`compute_history`].
pub const MAX_HISTORY_WINDOW_DAYS: u32 = 366;

/// Error for follow-up derivations.
#[derive(Debug)]
pub enum FollowUpError {
    Validation(AttendanceValidationError),
    /// Ledger read failed; nothing was derived.
    Ledger(RepoError),
    /// Roster read failed; nothing was derived.
    Roster(RepoError),
}

impl Display for FollowUpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Ledger(err) => write!(f, "attendance read failed: {err}"),
            Self::Roster(err) => write!(f, "roster read failed: {err}"),
        }
    }
}

impl Error for FollowUpError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Ledger(err) | Self::Roster(err) => Some(err),
        }
    }
}

impl From<AttendanceValidationError> for FollowUpError {
    fn from(value: AttendanceValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for FollowUpError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Ledger(other),
        }
    }
}

/// Classifies one member from last week's and this week's presence.
pub fn classify(previous: Presence, current: Presence) -> LapseState {
    match (previous, current) {
        (_, Presence::Present) => LapseState::StillPresent,
        (Presence::Present, _) => LapseState::NewlyAbsent,
        (Presence::Unknown, Presence::Unknown) => LapseState::Unknown,
        _ => LapseState::ChronicAbsent,
    }
}

/// Maps a lapse state to a call reason, if the state warrants a call.
pub fn call_reason(state: LapseState) -> Option<CallReason> {
    match state {
        LapseState::NewlyAbsent => Some(CallReason::AbsentThisWeek),
        LapseState::Unknown | LapseState::StillPresent | LapseState::ChronicAbsent => None,
    }
}

/// Returns `(previous_week, current_week)` for `today`.
pub fn snapshot_weeks(today: AttendanceDate) -> (AttendanceDate, AttendanceDate) {
    let current = today.most_recent_sunday();
    (current.weeks_before(1), current)
}

/// Derives the call list for the week containing `today`.
///
/// Output follows roster order; callers re-sort for display.
pub fn compute_call_list<L: AttendanceLedger + ?Sized>(
    today: AttendanceDate,
    roster: &[Member],
    ledger: &L,
) -> Result<Vec<CallTarget>, FollowUpError> {
    let (previous_week, current_week) = snapshot_weeks(today);

    let snapshots = ledger
        .get_by_date(previous_week)
        .and_then(|previous| Ok((previous, ledger.get_by_date(current_week)?)));
    let (previous, current) = match snapshots {
        Ok(snapshots) => snapshots,
        Err(err) => {
            error!(
                "event=call_list module=follow_up status=error week={} error={}",
                current_week, err
            );
            return Err(err.into());
        }
    };

    let previous = presence_map(&previous);
    let current = presence_map(&current);

    let mut targets = Vec::new();
    for member in roster.iter().filter(|member| member.is_active) {
        let key = member.id.trim();
        let state = classify(lookup(&previous, key), lookup(&current, key));
        if let Some(reason) = call_reason(state) {
            targets.push(CallTarget {
                member: member.clone(),
                reason,
            });
        }
    }

    info!(
        "event=call_list module=follow_up status=ok week={} previous_week={} roster={} targets={}",
        current_week,
        previous_week,
        roster.len(),
        targets.len()
    );
    Ok(targets)
}

/// Derives the daily trend for `window_days` days ending at `center_date`.
///
/// Days without any record are omitted. Output is newest first.
pub fn compute_history<L: AttendanceLedger + ?Sized>(
    center_date: AttendanceDate,
    window_days: u32,
    ledger: &L,
) -> Result<Vec<HistoryPoint>, FollowUpError> {
    if window_days > MAX_HISTORY_WINDOW_DAYS {
        return Err(AttendanceValidationError::InvalidWindow {
            requested: window_days,
            max: MAX_HISTORY_WINDOW_DAYS,
        }
        .into());
    }

    let mut points = Vec::new();
    for offset in 0..window_days {
        let date = center_date.days_before(u64::from(offset));
        let records = ledger.get_by_date(date)?;
        if let Some(point) = history_point(date, &records) {
            points.push(point);
        }
    }

    info!(
        "event=history module=follow_up status=ok center={} window_days={} points={}",
        center_date,
        window_days,
        points.len()
    );
    Ok(points)
}

/// Call-list facade combining a ledger with a roster provider.
pub struct FollowUpService<L: AttendanceLedger, R: RosterProvider> {
    ledger: L,
    roster: R,
}

impl<L: AttendanceLedger, R: RosterProvider> FollowUpService<L, R> {
    pub fn new(ledger: L, roster: R) -> Self {
        Self { ledger, roster }
    }

    /// Loads the roster and derives the call list for `today`.
    pub fn call_list(&self, today: AttendanceDate) -> Result<Vec<CallTarget>, FollowUpError> {
        let roster = self.roster.list_members().map_err(FollowUpError::Roster)?;
        compute_call_list(today, &roster, &self.ledger)
    }

    /// Derives the daily trend ending at `center_date`.
    pub fn history(
        &self,
        center_date: AttendanceDate,
        window_days: u32,
    ) -> Result<Vec<HistoryPoint>, FollowUpError> {
        compute_history(center_date, window_days, &self.ledger)
    }

    /// Classifies every active member without filtering to call targets.
    pub fn lapse_states(
        &self,
        today: AttendanceDate,
    ) -> Result<Vec<(Member, LapseState)>, FollowUpError> {
        let roster = self.roster.list_members().map_err(FollowUpError::Roster)?;
        let (previous_week, current_week) = snapshot_weeks(today);
        let previous = self.ledger.get_by_date(previous_week)?;
        let current = self.ledger.get_by_date(current_week)?;
        let previous = presence_map(&previous);
        let current = presence_map(&current);

        Ok(roster
            .into_iter()
            .filter(|member| member.is_active)
            .map(|member| {
                let key = member.id.trim();
                let state = classify(lookup(&previous, key), lookup(&current, key));
                (member, state)
            })
            .collect())
    }
}

fn presence_map(records: &[AttendanceRecord]) -> HashMap<&str, bool> {
    records
        .iter()
        .map(|record| (record.member_id.as_str(), record.present))
        .collect()
}

fn lookup(map: &HashMap<&str, bool>, member_id: &str) -> Presence {
    match map.get(member_id) {
        Some(true) => Presence::Present,
        Some(false) => Presence::Absent,
        None => Presence::Unknown,
    }
}
