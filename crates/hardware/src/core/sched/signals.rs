//! Scheduler operation types and per-tick boundary signals.
//!
//! This module defines everything that crosses the scheduler boundary. It provides:
//! 1. **Operation Classification:** Operations and the FU class that executes them.
//! 2. **Decoded Instructions:** Register numbers, optional immediate, branch dependence.
//! 3. **Tick Inputs:** The one instruction offered per tick and external die requests.
//! 4. **Tick Outputs:** Grant pulses, register-file enables, result and store buses,
//!    die/confirm vectors, branch resolution and status.

use serde::{Deserialize, Serialize};

use super::issue::StallReason;
use super::pending::GlobalPending;
use super::shadow::Prediction;
use crate::common::mask::Mask;

/// Operations understood by the execution units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// `dest = src1 + src2`.
    Add,
    /// `dest = src1 - src2`.
    Sub,
    /// `dest = src1 * src2`.
    Mul,
    /// `dest = src1 >> src2` (logical).
    Shr,
    /// Taken if `src1 > src2`.
    Bgt,
    /// Taken if `src1 < src2`.
    Blt,
    /// Taken if `src1 == src2`.
    Beq,
    /// Taken if `src1 != src2`.
    Bne,
    /// `dest = mem[src1 + imm]`.
    Load,
    /// `mem[src1 + imm] = src2`.
    Store,
}

/// FU class an operation is issued to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpClass {
    /// Integer ALU.
    Alu,
    /// Branch comparison unit.
    Branch,
    /// Load/store unit.
    LoadStore,
}

impl OpClass {
    /// Every class, in slot-numbering order.
    pub const ALL: [Self; 3] = [Self::Alu, Self::Branch, Self::LoadStore];

    /// Lowercase class name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Alu => "alu",
            Self::Branch => "branch",
            Self::LoadStore => "load/store",
        }
    }
}

impl Operation {
    /// Class of FU that executes this operation.
    pub const fn class(self) -> OpClass {
        match self {
            Self::Add | Self::Sub | Self::Mul | Self::Shr => OpClass::Alu,
            Self::Bgt | Self::Blt | Self::Beq | Self::Bne => OpClass::Branch,
            Self::Load | Self::Store => OpClass::LoadStore,
        }
    }

    /// Lowercase mnemonic.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Shr => "shr",
            Self::Bgt => "bgt",
            Self::Blt => "blt",
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Load => "load",
            Self::Store => "store",
        }
    }

    /// `true` if the operation produces a register result.
    pub const fn writes_register(self) -> bool {
        matches!(self.class(), OpClass::Alu) || matches!(self, Self::Load)
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mnemonic())
    }
}

/// One decoded instruction.
///
/// For ALU operations an immediate replaces `src2`. Loads and stores address
/// `src1 + imm`; a store writes `src2`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instruction {
    /// Operation.
    pub op: Operation,
    /// Destination register.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dest: Option<usize>,
    /// First source register.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src1: Option<usize>,
    /// Second source register.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src2: Option<usize>,
    /// Immediate operand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub imm: Option<u64>,
    /// Branch direction this instruction is conditional on.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speculation: Option<Prediction>,
}

impl Instruction {
    /// Register-register ALU or branch instruction.
    pub const fn rrr(op: Operation, dest: Option<usize>, src1: usize, src2: usize) -> Self {
        Self {
            op,
            dest,
            src1: Some(src1),
            src2: Some(src2),
            imm: None,
            speculation: None,
        }
    }

    /// ALU instruction with an immediate second operand.
    pub const fn rri(op: Operation, dest: usize, src1: usize, imm: u64) -> Self {
        Self {
            op,
            dest: Some(dest),
            src1: Some(src1),
            src2: None,
            imm: Some(imm),
            speculation: None,
        }
    }

    /// `dest = mem[base + offset]`.
    pub const fn load(dest: usize, base: usize, offset: u64) -> Self {
        Self {
            op: Operation::Load,
            dest: Some(dest),
            src1: Some(base),
            src2: None,
            imm: Some(offset),
            speculation: None,
        }
    }

    /// `mem[base + offset] = data`.
    pub const fn store(data: usize, base: usize, offset: u64) -> Self {
        Self {
            op: Operation::Store,
            dest: None,
            src1: Some(base),
            src2: Some(data),
            imm: Some(offset),
            speculation: None,
        }
    }

    /// Same instruction, conditional on `prediction`.
    #[must_use]
    pub const fn speculative(mut self, prediction: Prediction) -> Self {
        self.speculation = Some(prediction);
        self
    }

    /// FU class this instruction issues to.
    pub const fn class(&self) -> OpClass {
        self.op.class()
    }

    /// Registers claimed for write (none for branches and stores).
    pub const fn write_reg(&self) -> Option<usize> {
        if self.op.writes_register() {
            self.dest
        } else {
            None
        }
    }

    /// Second source register actually read (an ALU immediate replaces it).
    pub const fn read_src2(&self) -> Option<usize> {
        match (self.op.class(), self.imm) {
            (OpClass::Alu | OpClass::Branch, Some(_)) => None,
            _ => self.src2,
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.op)?;
        if let Some(d) = self.dest {
            write!(f, " r{d}")?;
        }
        for s in [self.src1, self.src2].into_iter().flatten() {
            write!(f, " r{s}")?;
        }
        if let Some(i) = self.imm {
            write!(f, " #{i}")?;
        }
        if let Some(p) = self.speculation {
            write!(f, " [{p:?}]")?;
        }
        Ok(())
    }
}

/// Inputs sampled by one scheduler tick.
#[derive(Clone, Debug)]
pub struct TickInputs {
    /// Instruction offered by the front end this tick.
    pub issue: Option<Instruction>,
    /// External die request (exception flush), indexed by FU slot.
    pub flush: Mask,
}

impl TickInputs {
    /// No instruction and no flush.
    pub fn idle(num_fus: usize) -> Self {
        Self {
            issue: None,
            flush: Mask::new(num_fus),
        }
    }

    /// Offers `insn` for issue.
    pub fn with_issue(num_fus: usize, insn: Instruction) -> Self {
        Self {
            issue: Some(insn),
            flush: Mask::new(num_fus),
        }
    }
}

/// Signals produced by one scheduler tick.
///
/// Grant vectors are one-hot or empty; register enables are asserted exactly
/// on the tick their grant fires.
#[derive(Clone, Debug)]
pub struct TickOutputs {
    /// Operand read grants.
    pub go_read: Mask,
    /// Result write grants.
    pub go_write: Mask,
    /// Load/store address grants.
    pub go_addr: Mask,
    /// Store completion grants.
    pub go_store: Mask,
    /// Register read enables for source ports 1 and 2.
    pub ren: [Mask; 2],
    /// Register write enable.
    pub wen: Mask,
    /// Value driven on the result bus, valid with `go_write`.
    pub result: Option<u64>,
    /// `(address, data)` written to memory this tick.
    pub store: Option<(u64, u64)>,
    /// Slots killed this tick.
    pub die: Mask,
    /// Slots whose branch shadow was confirmed this tick.
    pub confirm: Mask,
    /// Outcome of a branch resolved this tick.
    pub branch_resolved: Option<bool>,
    /// Slots granted-eligible to read this tick.
    pub readable: Mask,
    /// Slots granted-eligible to write this tick.
    pub writable: Mask,
    /// Latched busy flags at the start of the tick (`busy_o`).
    pub busy: Mask,
    /// Register pending vectors at the start of the tick.
    pub pending: GlobalPending,
    /// The offered instruction was accepted.
    pub issue_accepted: bool,
    /// Slot the instruction was issued to.
    pub issued_fu: Option<usize>,
    /// Why an offered instruction was refused.
    pub stall: Option<StallReason>,
}
