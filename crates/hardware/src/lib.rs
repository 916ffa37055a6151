//! Out-of-order scoreboard scheduler library.
//!
//! This crate models a CDC 6600 style scoreboard at the level of its latches
//! and grant pulses. It provides:
//! 1. **Scheduler:** Register and FU-FU hazard matrices, priority pickers, branch
//!    and order shadows, computation-unit latches and the issue unit, advanced
//!    one tick at a time by `Scoreboard::tick`.
//! 2. **Execution units:** Fixed-latency ALU, branch and address units behind the
//!    `ExecutionUnit` interface, and a flat data memory.
//! 3. **Simulation:** Program loading, the instruction queue front end, a
//!    sequential reference interpreter and the `Simulator` driver.
//! 4. **Configuration and statistics:** JSON configuration and per-run counters.

/// Common types (bit masks, register file, errors).
pub mod common;
/// Simulator configuration (defaults and hierarchical config structures).
pub mod config;
/// Scheduler and execution units.
pub mod core;
/// Program loading, front end, reference interpreter and simulator driver.
pub mod sim;
/// Scheduler statistics collection and reporting.
pub mod stats;

/// Root configuration type; use `Config::default()` or `Config::from_json`.
pub use crate::config::Config;
/// The scheduler; advance with `Scoreboard::tick`.
pub use crate::core::Scoreboard;
/// Scheduler plus register file, memory and instruction queue.
pub use crate::sim::Simulator;
