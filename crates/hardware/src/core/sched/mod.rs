//! Scoreboard scheduler.
//!
//! This module implements a CDC 6600 style scoreboard from small bit-matrix
//! state machines evaluated once per tick. It includes:
//! 1. **Primitives:** The set/reset hazard cell, cell grids and priority pickers.
//! 2. **Matrices:** Register claims per operand port, FU-FU ordering, memory ordering
//!    and the global pending reduction.
//! 3. **Speculation:** Branch and order shadows with confirm/kill on resolution.
//! 4. **Handshake:** Per-slot computation units and the issue unit.
//! 5. **Composition:** The top-level [`Scoreboard`].

/// Per-slot latch set and request/grant handshake.
pub mod compunit;

/// Register dependency matrix (FU × register, per operand port).
pub mod dep_matrix;

/// FU-FU dependency matrix.
pub mod fu_matrix;

/// Two-dimensional hazard cell storage.
pub mod grid;

/// Issue unit, register decode and stall rules.
pub mod issue;

/// Set/reset latch primitive.
pub mod latch;

/// Load/store ordering matrix.
pub mod mem_matrix;

/// Global register pending vectors.
pub mod pending;

/// Priority and group pickers.
pub mod picker;

/// Top-level scoreboard.
pub mod scoreboard;

/// Shadow matrix and branch speculation record.
pub mod shadow;

/// Operation types and per-tick boundary signals.
pub mod signals;

/// Execution-unit and data-memory interfaces.
pub mod traits;

pub use self::scoreboard::Scoreboard;
