//! In-flight write tracking for attendance batches.
//!
//! At most one `upsert_many` per date may be pending. The slot is released
//! when the returned [`WriteSlot`] is dropped, whatever the write outcome.

use crate::model::date::AttendanceDate;
use crate::repo::attendance_repo::{RepoError, RepoResult};
use log::warn;
use std::collections::BTreeSet;
use std::sync::{Mutex, MutexGuard};

/// Set of dates with a write currently in progress.
#[derive(Debug, Default)]
pub struct InFlightWrites {
    dates: Mutex<BTreeSet<AttendanceDate>>,
}

impl InFlightWrites {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims the write slot for `date`.
    ///
    /// # Errors
    /// - `RepoError::WriteInProgress` when another writer holds the slot.
    pub fn begin(&self, date: AttendanceDate) -> RepoResult<WriteSlot<'_>> {
        if !self.lock().insert(date) {
            warn!("event=attendance_upsert module=write_guard status=rejected date={date}");
            return Err(RepoError::WriteInProgress(date));
        }
        Ok(WriteSlot { owner: self, date })
    }

    pub fn is_pending(&self, date: AttendanceDate) -> bool {
        self.lock().contains(&date)
    }

    fn lock(&self) -> MutexGuard<'_, BTreeSet<AttendanceDate>> {
        // A panicking writer must not wedge the date forever.
        self.dates
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Claimed write slot; releases its date on drop.
#[derive(Debug)]
pub struct WriteSlot<'a> {
    owner: &'a InFlightWrites,
    date: AttendanceDate,
}

impl WriteSlot<'_> {
    pub fn date(&self) -> AttendanceDate {
        self.date
    }
}

impl Drop for WriteSlot<'_> {
    fn drop(&mut self) {
        self.owner.lock().remove(&self.date);
    }
}

#[cfg(test)]
mod tests {
    use super::InFlightWrites;
    use crate::model::date::AttendanceDate;
    use crate::repo::attendance_repo::RepoError;

    #[test]
    fn second_writer_for_same_date_is_rejected_until_release() {
        let writes = InFlightWrites::new();
        let date = AttendanceDate::parse("2024-03-10").unwrap();
        let other = AttendanceDate::parse("2024-03-17").unwrap();

        let slot = writes.begin(date).unwrap();
        assert!(matches!(
            writes.begin(date).unwrap_err(),
            RepoError::WriteInProgress(d) if d == date
        ));
        let other_slot = writes.begin(other).unwrap();
        assert_eq!(other_slot.date(), other);

        drop(slot);
        assert!(!writes.is_pending(date));
        assert!(writes.begin(date).is_ok());
    }
}
