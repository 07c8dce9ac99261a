//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the attendance ledger and roster contracts.
//! - Isolate SQLite query details from the engine and stats helpers.
//!
//! # Invariants
//! - Write paths validate input before any SQL mutation.
//! - Read paths return empty results for missing data instead of erroring.

pub mod attendance_repo;
pub mod roster_repo;
