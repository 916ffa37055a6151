//! Issue unit.
//!
//! This module accepts at most one decoded instruction per tick and routes it
//! to a free FU slot of the matching class. It provides:
//! 1. **Register Decode:** Register numbers to one-hot masks per operand port.
//! 2. **Issue Groups:** One priority picker per opcode class over its free slots.
//! 3. **Stall Rules:** Why an offered instruction was refused; the front end
//!    holds the instruction and offers it again next tick.

use super::picker::PriorityPicker;
use super::signals::{Instruction, OpClass};
use crate::common::mask::Mask;

/// Register masks of one instruction, one per operand port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedRegs {
    /// Destination claim (empty for branches and stores).
    pub dest: Mask,
    /// First source claim.
    pub src1: Mask,
    /// Second source claim (empty when an immediate replaces it).
    pub src2: Mask,
}

/// Register-number to one-hot decoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegDecode;

impl RegDecode {
    /// Decodes the register operands of `insn` for a file of `num_regs` registers.
    pub fn decode(insn: &Instruction, num_regs: usize) -> DecodedRegs {
        DecodedRegs {
            dest: Mask::from_indices(num_regs, insn.write_reg()),
            src1: Mask::from_indices(num_regs, insn.src1),
            src2: Mask::from_indices(num_regs, insn.read_src2()),
        }
    }
}

/// Reason an offered instruction was not accepted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StallReason {
    /// Every slot of the instruction's class is busy.
    NoFreeUnit,
    /// The destination already has a pending writer and WAW stalls are enabled.
    WriteAfterWrite,
    /// A branch is already unresolved.
    BranchPending,
    /// The instruction depends on a branch resolving this very tick.
    SpeculationResolving,
    /// The instruction carries a branch dependence but no branch is active.
    NoActiveBranch,
}

impl StallReason {
    /// Every reason, for reporting.
    pub const ALL: [Self; 5] = [
        Self::NoFreeUnit,
        Self::WriteAfterWrite,
        Self::BranchPending,
        Self::SpeculationResolving,
        Self::NoActiveBranch,
    ];

    /// Short name used in statistics output.
    pub const fn name(self) -> &'static str {
        match self {
            Self::NoFreeUnit => "no_free_unit",
            Self::WriteAfterWrite => "waw",
            Self::BranchPending => "branch_pending",
            Self::SpeculationResolving => "speculation_resolving",
            Self::NoActiveBranch => "no_active_branch",
        }
    }
}

/// Slots of one opcode class.
#[derive(Clone, Debug)]
pub struct IssueUnitGroup {
    class: OpClass,
    slots: Mask,
}

impl IssueUnitGroup {
    /// Group covering `slots` for `class`.
    pub const fn new(class: OpClass, slots: Mask) -> Self {
        Self { class, slots }
    }

    /// Class served.
    pub const fn class(&self) -> OpClass {
        self.class
    }

    /// Slots in the group.
    pub const fn slots(&self) -> &Mask {
        &self.slots
    }

    /// Lowest-numbered free slot: `PriorityPicker(!busy & slots)`.
    pub fn pick(&self, busy: &Mask) -> Option<usize> {
        PriorityPicker::winner(&self.slots.and_not(busy))
    }
}

/// Latched state the issue decision depends on.
#[derive(Clone, Copy, Debug)]
pub struct IssueContext<'a> {
    /// Latched busy flags.
    pub busy: &'a Mask,
    /// Registers with a pending writer.
    pub write_pending: &'a Mask,
    /// A branch is unresolved.
    pub branch_active: bool,
    /// The active branch resolves this tick.
    pub resolving: bool,
}

/// Result of offering one instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IssueDecision {
    /// Issue into `fu`.
    Accept {
        /// Chosen slot.
        fu: usize,
        /// Decoded register claims.
        regs: DecodedRegs,
    },
    /// Refused this tick.
    Stall(StallReason),
}

/// One-instruction-per-tick issue unit.
#[derive(Clone, Debug)]
pub struct IssueUnit {
    groups: Vec<IssueUnitGroup>,
    num_regs: usize,
    stall_on_waw: bool,
}

impl IssueUnit {
    /// Creates the issue unit.
    ///
    /// # Arguments
    ///
    /// * `classes` - Class of every slot, by slot number.
    /// * `num_regs` - Register file size.
    /// * `stall_on_waw` - Refuse instructions whose destination has a pending writer.
    pub fn new(classes: &[OpClass], num_regs: usize, stall_on_waw: bool) -> Self {
        let groups = OpClass::ALL
            .iter()
            .map(|&class| {
                let members = classes
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| **c == class)
                    .map(|(i, _)| i);
                let slots = Mask::from_indices(classes.len(), members);
                IssueUnitGroup::new(class, slots)
            })
            .collect();
        Self {
            groups,
            num_regs,
            stall_on_waw,
        }
    }

    /// Group for `class`.
    pub fn group(&self, class: OpClass) -> Option<&IssueUnitGroup> {
        self.groups.iter().find(|g| g.class == class)
    }

    /// Decides whether `insn` issues this tick, and where.
    pub fn decide(&self, insn: &Instruction, ctx: &IssueContext<'_>) -> IssueDecision {
        if insn.speculation.is_some() {
            if ctx.resolving {
                return IssueDecision::Stall(StallReason::SpeculationResolving);
            }
            if !ctx.branch_active {
                return IssueDecision::Stall(StallReason::NoActiveBranch);
            }
        }
        if insn.class() == OpClass::Branch && ctx.branch_active {
            return IssueDecision::Stall(StallReason::BranchPending);
        }
        let regs = RegDecode::decode(insn, self.num_regs);
        if self.stall_on_waw && regs.dest.intersects(ctx.write_pending) {
            return IssueDecision::Stall(StallReason::WriteAfterWrite);
        }
        match self.group(insn.class()).and_then(|g| g.pick(ctx.busy)) {
            Some(fu) => IssueDecision::Accept { fu, regs },
            None => IssueDecision::Stall(StallReason::NoFreeUnit),
        }
    }
}
