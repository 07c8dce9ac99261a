//! Domain model for attendance tracking and follow-up targeting.
//!
//! # Responsibility
//! - Define canonical data structures used by ledger, engine and stats.
//! - Keep one date-key representation for every attendance fact.
//!
//! # Invariants
//! - Attendance facts are identified by `(member_id, sunday_date)`.
//! - There is no delete; corrections are new upserts.

pub mod attendance;
pub mod date;
pub mod follow_up;
pub mod member;
