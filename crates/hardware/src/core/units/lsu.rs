//! Load/store effective-address unit.
//!
//! The data access itself is performed by the scheduler on the `go_addr`
//! grant; this unit only produces `base + offset`.

use super::{LatencyPipe, evaluate};
use crate::core::sched::signals::Operation;
use crate::core::sched::traits::ExecutionUnit;

/// Address generator for loads and stores.
#[derive(Clone, Debug)]
pub struct AddressUnit {
    latency: u32,
    pipe: LatencyPipe,
}

impl AddressUnit {
    /// Creates an idle address unit.
    pub const fn new(latency: u32) -> Self {
        Self {
            latency,
            pipe: LatencyPipe::new(),
        }
    }
}

impl ExecutionUnit for AddressUnit {
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
