//! Scheduler core.
//!
//! This module contains the out-of-order scheduler itself and the execution
//! units it drives.

/// Scoreboard scheduler (matrices, pickers, shadows, issue, computation units).
pub mod sched;

/// Execution units (ALU, branch, load/store address) and data memory.
pub mod units;

pub use self::sched::Scoreboard;
