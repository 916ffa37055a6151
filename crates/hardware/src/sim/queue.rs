//! Instruction queue front end.
//!
//! Holds the not-yet-issued part of the program and decides what to offer the
//! scheduler each tick. While a branch is unresolved only instructions tagged
//! with a branch dependence (and the next branch, which the issue unit refuses)
//! are offered; untagged work waits so it cannot be shadowed by a branch it
//! does not depend on. Once the branch resolves, queued instructions tagged
//! with the wrong direction are discarded and the rest become unconditional.

use std::collections::VecDeque;

use crate::core::sched::signals::{Instruction, OpClass};

/// What the front end presents to the scheduler this tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Offer {
    /// Nothing left to issue.
    Empty,
    /// An untagged instruction is held behind an unresolved branch.
    Hold,
    /// Offer this instruction for issue.
    Issue(Instruction),
}

/// In-order queue of instructions awaiting issue.
#[derive(Clone, Debug, Default)]
pub struct InstructionQueue {
    pending: VecDeque<Instruction>,
}

impl InstructionQueue {
    /// Queue holding `instructions` in program order.
    pub fn new(instructions: impl IntoIterator<Item = Instruction>) -> Self {
        Self {
            pending: instructions.into_iter().collect(),
        }
    }

    /// Instructions not yet issued.
    pub fn qlen(&self) -> usize {
        self.pending.len()
    }

    /// `true` once every instruction has issued or been discarded.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Appends an instruction behind everything already queued.
    pub fn push(&mut self, insn: Instruction) {
        self.pending.push_back(insn);
    }

    /// Head of the queue.
    pub fn peek(&self) -> Option<&Instruction> {
        self.pending.front()
    }

    /// Chooses what to offer given whether a branch is currently unresolved.
    pub fn offer(&self, branch_active: bool) -> Offer {
        match self.pending.front() {
            None => Offer::Empty,
            Some(insn)
                if branch_active
                    && insn.speculation.is_none()
                    && insn.class() != OpClass::Branch =>
            {
                Offer::Hold
            }
            Some(insn) => Offer::Issue(insn.clone()),
        }
    }

    /// Removes the head after the scheduler accepted it.
    pub fn pop(&mut self) -> Option<Instruction> {
        self.pending.pop_front()
    }

    /// Applies a branch outcome to the queued instructions that depend on it.
    ///
    /// Only instructions up to the next queued branch are affected.
    /// Returns the number of instructions discarded.
    pub fn resolve(&mut self, taken: bool) -> usize {
        self.settle(|insn| insn.speculation.is_none_or(|p| p.matches(taken)))
    }

    /// Discards every queued instruction that depended on a branch that was
    /// killed before resolving. Returns the number discarded.
    pub fn abandon(&mut self) -> usize {
        self.settle(|insn| insn.speculation.is_none())
    }

    /// Drops or untags instructions up to and including the next surviving
    /// branch. A dropped branch never resolves, so the scope runs on past it.
    fn settle(&mut self, keep: impl Fn(&Instruction) -> bool) -> usize {
        let before = self.pending.len();
        let mut in_scope = true;
        let mut kept = VecDeque::with_capacity(before);
        for mut insn in self.pending.drain(..) {
            if in_scope {
                if !keep(&insn) {
                    continue;
                }
                insn.speculation = None;
                in_scope = insn.class() != OpClass::Branch;
            }
            kept.push_back(insn);
        }
        self.pending = kept;
        before - self.pending.len()
    }
}
