//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate ledger and roster calls into use-case level APIs.
//! - Host the follow-up engine and stats helpers, which perform no I/O of
//!   their own beyond ledger reads.

pub mod attendance_service;
pub mod follow_up_service;
pub mod stats;
pub mod write_guard;
