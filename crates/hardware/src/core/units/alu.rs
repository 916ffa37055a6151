//! Integer ALU.
//!
//! Pipelined only in the sense of holding one operation: a slot issues at most
//! one instruction at a time, so the ALU never needs more than one entry. The
//! latency depends on the operation.

use super::{LatencyPipe, evaluate};
use crate::config::LatencyConfig;
use crate::core::sched::signals::Operation;
use crate::core::sched::traits::ExecutionUnit;

/// Integer ALU with per-operation latency.
#[derive(Clone, Debug)]
pub struct AluUnit {
    latency: LatencyConfig,
    width: u32,
    pipe: LatencyPipe,
}

impl AluUnit {
    /// Creates an idle ALU.
    ///
    /// # Arguments
    ///
    /// * `latency` - Per-operation latencies in ticks.
    /// * `width` - Register width; results are truncated to it.
    pub const fn new(latency: LatencyConfig, width: u32) -> Self {
        Self {
            latency,
            width,
            pipe: LatencyPipe::new(),
        }
    }

    /// Latency of `op` on this unit.
    pub const fn latency_of(&self, op: Operation) -> u32 {
        match op {
            Operation::Sub => self.latency.sub,
            Operation::Mul => self.latency.mul,
            Operation::Shr => self.latency.shr,
            _ => self.latency.add,
        }
    }
}

impl ExecutionUnit for AluUnit {
    fn start(&mut self, op: Operation, a: u64, b: u64) {
        let latency = self.latency_of(op);
        self.pipe.start(evaluate(op, a, b, self.width), latency);
    }

    fn tick(&mut self) {
        self.pipe.tick();
    }

    fn result(&self) -> Option<u64> {
        self.pipe.output()
    }

    fn consume(&mut self) {
        self.pipe.flush();
    }

    fn cancel(&mut self) {
        self.pipe.flush();
    }
}
