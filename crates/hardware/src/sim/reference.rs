//! Sequential reference interpreter.
//!
//! `RegSim` executes a program one instruction at a time in program order with
//! no timing. It applies the same branch-dependence rules as the scheduler: an
//! instruction tagged with a direction executes only if the most recent branch
//! went that way. The final register file and memory of a scoreboard run must
//! match it exactly.

use tracing::trace;

use super::program::Program;
use crate::common::reg::RegisterFile;
use crate::config::Config;
use crate::core::sched::signals::{Instruction, OpClass, Operation};
use crate::core::sched::traits::DataMemory;
use crate::core::units::{FlatMemory, evaluate};

/// In-order, zero-latency interpreter.
#[derive(Clone, Debug)]
pub struct RegSim {
    regs: RegisterFile,
    memory: FlatMemory,
    outcome: Option<bool>,
    executed: u64,
}

impl RegSim {
    /// Interpreter initialised from `program`'s registers and memory.
    pub fn new(config: &Config, program: &Program) -> Self {
        let mut regs = RegisterFile::new(config.scheduler.num_regs, config.scheduler.reg_width);
        for (i, v) in program.registers.iter().enumerate() {
            regs.write(i, *v);
        }
        Self {
            regs,
            memory: FlatMemory::with_contents(config.memory.words, &program.memory),
            outcome: None,
            executed: 0,
        }
    }

    /// Runs `config` and `program` to completion.
    pub fn execute(config: &Config, program: &Program) -> Self {
        let mut sim = Self::new(config, program);
        for insn in &program.instructions {
            let _ = sim.step(insn);
        }
        sim
    }

    /// Executes one instruction. Returns `false` if it was skipped because its
    /// branch went the other way.
    pub fn step(&mut self, insn: &Instruction) -> bool {
        if let Some(pred) = insn.speculation {
            if !self.outcome.is_some_and(|taken| pred.matches(taken)) {
                trace!(%insn, "skipped");
                return false;
            }
        }
        let r = |reg: Option<usize>| reg.map_or(0, |i| self.regs.read(i));
        let a = r(insn.src1);
        let width = self.regs.width();
        match insn.class() {
            OpClass::Alu => {
                let b = insn.imm.unwrap_or_else(|| r(insn.src2));
                let v = evaluate(insn.op, a, b, width);
                if let Some(d) = insn.dest {
                    self.regs.write(d, v);
                }
            }
            OpClass::Branch => {
                let b = insn.imm.unwrap_or_else(|| r(insn.src2));
                self.outcome = Some(evaluate(insn.op, a, b, width) != 0);
            }
            OpClass::LoadStore => {
                let addr = evaluate(insn.op, a, insn.imm.unwrap_or(0), 64);
                if insn.op == Operation::Load {
                    let v = self.memory.read(addr);
                    if let Some(d) = insn.dest {
                        self.regs.write(d, v);
                    }
                } else {
                    let data = r(insn.src2);
                    self.memory.write(addr, data);
                }
            }
        }
        self.executed += 1;
        true
    }

    /// Register file.
    pub const fn registers(&self) -> &RegisterFile {
        &self.regs
    }

    /// Data memory.
    pub const fn memory(&self) -> &FlatMemory {
        &self.memory
    }

    /// Instructions executed (not skipped).
    pub const fn executed(&self) -> u64 {
        self.executed
    }
}
