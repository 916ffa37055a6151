//! # Integration Tests
//!
//! Each module drives one concern of the scheduler through its public API.

/// JSON configuration parsing and validation.
pub mod config;

/// Register, memory and FU-FU hazard ordering through full ticks.
pub mod hazards;

/// Property tests for the pickers and hazard cells.
pub mod picker;


/// Branch shadows, confirm/kill and external die.
pub mod speculation;

/// Execution-unit latencies and the unit/memory handshake.
pub mod units;
