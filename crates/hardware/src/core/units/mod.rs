//! Execution units behind the FU slots.
//!
//! This module contains the black-box execution units the scheduler drives
//! through [`ExecutionUnit`]: the integer ALU, the branch comparison unit and
//! the load/store address generator, plus the flat data memory. Every unit
//! is built on [`LatencyPipe`], a single-entry pipeline that holds a result
//! for a fixed number of ticks.

/// Integer ALU (add, sub, mul, shift right).
pub mod alu;

/// Branch comparison unit.
pub mod bru;

/// Load/store effective-address unit.
pub mod lsu;

/// Word-addressed data memory.
pub mod memory;

use crate::config::Config;
use crate::core::sched::signals::{OpClass, Operation};
use crate::core::sched::traits::ExecutionUnit;

pub use self::alu::AluUnit;
pub use self::bru::BranchUnit;
pub use self::lsu::AddressUnit;
pub use self::memory::FlatMemory;

/// Single-entry fixed-latency pipeline.
///
/// `start` latches a value that becomes visible after `latency` calls to
/// `tick`; it stays visible until `flush`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LatencyPipe {
    value: Option<u64>,
    remaining: u32,
}

impl LatencyPipe {
    /// An empty pipe.
    pub const fn new() -> Self {
        Self {
            value: None,
            remaining: 0,
        }
    }

    /// Loads `value` with `latency` ticks to go.
    pub const fn start(&mut self, value: u64, latency: u32) {
        self.value = Some(value);
        self.remaining = latency;
    }

    /// Advances one tick.
    pub const fn tick(&mut self) {
        if self.value.is_some() && self.remaining > 0 {
            self.remaining -= 1;
        }
    }

    /// The value, once its latency has elapsed.
    pub const fn output(&self) -> Option<u64> {
        if self.remaining == 0 {
            self.value
        } else {
            None
        }
    }

    /// `true` while a value is in flight or waiting.
    #[cfg(test)]
    pub(crate) const fn occupied(&self) -> bool {
        self.value.is_some()
    }

    /// Empties the pipe.
    pub const fn flush(&mut self) {
        self.value = None;
        self.remaining = 0;
    }
}

/// Builds the execution unit for a slot of class `class`.
pub fn build_unit(class: OpClass, config: &Config) -> Box<dyn ExecutionUnit> {
    match class {
        OpClass::Alu => Box::new(AluUnit::new(
            config.latency.clone(),
            config.scheduler.reg_width,
        )),
        OpClass::Branch => Box::new(BranchUnit::new(config.latency.branch)),
        OpClass::LoadStore => Box::new(AddressUnit::new(config.latency.address)),
    }
}

/// Combinational result of `op`, masked to `width` bits, shared by the units
/// and the reference interpreter.
///
/// Branch operations yield `1` (taken) or `0`; loads and stores yield the
/// effective address `a + b`.
pub const fn evaluate(op: Operation, a: u64, b: u64, width: u32) -> u64 {
    let mask = crate::common::reg::width_mask(width);
    let v = match op {
        Operation::Add | Operation::Load | Operation::Store => a.wrapping_add(b),
        Operation::Sub => a.wrapping_sub(b),
        Operation::Mul => a.wrapping_mul(b),
        Operation::Shr => {
            if b >= width as u64 {
                0
            } else {
                (a & mask) >> b
            }
        }
        Operation::Bgt => (a > b) as u64,
        Operation::Blt => (a < b) as u64,
        Operation::Beq => (a == b) as u64,
        Operation::Bne => (a != b) as u64,
    };
    v & mask
}
