//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `flocknote_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

use flocknote_core::db::{migrations::latest_version, open_db_in_memory};
use flocknote_core::{AttendanceDate, AttendanceLedger, SqliteAttendanceLedger};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("flocknote_core ping={}", flocknote_core::ping());
    println!("flocknote_core version={}", flocknote_core::core_version());
    println!("flocknote_core schema_version={}", latest_version());

    // Opening a scratch ledger exercises migrations without touching app data.
    let probe = open_db_in_memory()
        .map_err(|err| err.to_string())
        .and_then(|conn| {
            let ledger = SqliteAttendanceLedger::try_new(&conn).map_err(|err| err.to_string())?;
            let week = AttendanceDate::today().most_recent_sunday();
            ledger
                .get_by_date(week)
                .map(|records| (week, records.len()))
                .map_err(|err| err.to_string())
        });

    match probe {
        Ok((week, records)) => {
            println!("flocknote_core ledger=ok week={week} records={records}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("flocknote_core ledger=error error={err}");
            ExitCode::FAILURE
        }
    }
}
