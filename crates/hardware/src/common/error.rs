//! Error and protocol-violation definitions.
//!
//! This module defines the error types for the scheduler and its simulation
//! driver. It provides:
//! 1. **Protocol violations:** Structural bugs in the matrices (two grants on one
//!    lane, a busy flag that disagrees with its hazard row, a write grant to an idle
//!    unit). These are never handled at runtime; tests surface them through
//!    `Scoreboard::check_invariants`.
//! 2. **Configuration errors:** Rejected parameter combinations.
//! 3. **Program errors:** Malformed instruction streams.
//! 4. **Simulation errors:** The top-level error returned by the driver.

use std::io;

use thiserror::Error;

/// Grant lane of the scheduler, used to label grant-related violations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Lane {
    /// Operand read lane (`go_read`).
    Read,
    /// Result write lane (`go_write`).
    Write,
    /// Load/store address lane (`go_addr`).
    Address,
    /// Store completion lane (`go_store`).
    Store,
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Address => "address",
            Self::Store => "store",
        };
        f.write_str(name)
    }
}

/// An observed state that can only arise from a structural bug.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProtocolViolation {
    /// More than one FU received a grant on a single-winner lane.
    #[error("{count} simultaneous grants on the {lane} lane")]
    MultipleGrants {
        /// Lane that produced the grants.
        lane: Lane,
        /// Number of grants observed.
        count: usize,
    },

    /// A grant fired for a slot that was never issued.
    #[error("{lane} grant to idle function unit slot {fu}")]
    GrantToIdleUnit {
        /// Lane that produced the grant.
        lane: Lane,
        /// Idle FU slot.
        fu: usize,
    },

    /// A slot's busy flag disagrees with the OR of its hazard row.
    #[error("function unit {fu}: busy={busy} but hazard row pending={row}")]
    BusyRowMismatch {
        /// FU slot.
        fu: usize,
        /// Latched busy flag.
        busy: bool,
        /// OR of every hazard cell in the row.
        row: bool,
    },

    /// Two FUs hold a write enable for the same register in the same tick.
    #[error("multiple writers for register {reg}")]
    MultipleWriters {
        /// Register index.
        reg: usize,
    },

    /// A slot is order-shadowed by more than one predecessor.
    #[error("function unit {fu} has more than one order predecessor")]
    OrderChainFork {
        /// FU slot.
        fu: usize,
    },
}

/// Invalid configuration parameters.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The register file must hold at least one register.
    #[error("num_regs must be non-zero")]
    NoRegisters,

    /// At least one FU slot must exist.
    #[error("at least one function unit slot is required")]
    NoUnits,

    /// Register width outside `1..=64`.
    #[error("reg_width {0} is outside 1..=64")]
    RegisterWidth(u32),

    /// Execution latencies are at least one tick.
    #[error("latency for {0} must be at least one tick")]
    ZeroLatency(&'static str),

    /// Data memory size must be a non-zero power of two.
    #[error("memory words {0} must be a non-zero power of two")]
    MemorySize(usize),

    /// The configuration text could not be parsed.
    #[error("config parse error: {0}")]
    Parse(String),
}

/// Malformed instruction streams.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ProgramError {
    /// A register operand is outside the register file.
    #[error("instruction {index}: register r{reg} out of range (num_regs = {num_regs})")]
    RegisterOutOfRange {
        /// Instruction position.
        index: usize,
        /// Offending register number.
        reg: usize,
        /// Configured register count.
        num_regs: usize,
    },

    /// An operation is missing an operand it requires.
    #[error("instruction {index}: {op} requires {operand}")]
    MissingOperand {
        /// Instruction position.
        index: usize,
        /// Operation mnemonic.
        op: &'static str,
        /// Name of the missing operand.
        operand: &'static str,
    },

    /// A speculation tag appears before any branch.
    #[error("instruction {index}: speculation tag without a preceding branch")]
    OrphanSpeculation {
        /// Instruction position.
        index: usize,
    },

    /// The program text could not be parsed.
    #[error("program parse error: {0}")]
    Parse(String),

    /// No slot of the class an operation needs is configured.
    #[error("instruction {index}: no {class} unit configured")]
    NoUnitForClass {
        /// Instruction position.
        index: usize,
        /// Opcode class name.
        class: &'static str,
    },
}

/// Top-level error of the simulation driver.
#[derive(Debug, Error)]
pub enum SimError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid program.
    #[error(transparent)]
    Program(#[from] ProgramError),

    /// Failed to read a program or config file.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The run did not drain within the cycle limit.
    #[error("no forward progress after {cycles} cycles")]
    Timeout {
        /// Cycles simulated before giving up.
        cycles: u64,
    },

    /// An invariant check failed during a checked run.
    #[error("protocol violation at cycle {cycle}: {violation}")]
    Protocol {
        /// Cycle at which the check failed.
        cycle: u64,
        /// The violation observed.
        violation: ProtocolViolation,
    },
}
