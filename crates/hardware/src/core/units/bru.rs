//! Branch comparison unit.

use super::{LatencyPipe, evaluate};
use crate::core::sched::signals::Operation;
use crate::core::sched::traits::ExecutionUnit;

/// Compares two operands; the result is `1` when the branch is taken.
#[derive(Clone, Debug)]
pub struct BranchUnit {
    latency: u32,
    pipe: LatencyPipe,
}

impl BranchUnit {
    /// Creates an idle branch unit with a fixed comparison latency.
    pub const fn new(latency: u32) -> Self {
        Self {
            latency,
            pipe: LatencyPipe::new(),
        }
    }
}

impl ExecutionUnit for BranchUnit {
    fn start(&mut self, op: Operation, a: u64, b: u64) {
        self.pipe.start(evaluate(op, a, b, 64), self.latency);
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
