//! Collaborator interfaces.
//!
//! This module defines the black boxes the scheduler drives. It provides:
//! 1. **Execution Unit Interface:** Start, advance, and consume one operation.
//! 2. **Data Memory Interface:** Word-addressed loads and stores.

use super::signals::Operation;

/// Execution unit attached to one FU slot.
///
/// The scheduler only relies on: after `start`, `result` becomes `Some` after
/// some number of `tick`s and stays `Some` until `consume` or `cancel`.
pub trait ExecutionUnit {
    /// Begins `op` on operands `a` and `b`. Called on the `go_read` tick.
    fn start(&mut self, op: Operation, a: u64, b: u64);

    /// Advances one tick. Called in every latch phase.
    fn tick(&mut self);

    /// Result, once valid.
    fn result(&self) -> Option<u64>;

    /// The result has been taken by the scheduler.
    fn consume(&mut self);

    /// Discards any in-flight operation (die).
    fn cancel(&mut self);
}

/// Word-addressed data memory.
pub trait DataMemory {
    /// Reads the word at `addr`.
    fn read(&self, addr: u64) -> u64;

    /// Writes `value` at `addr`.
    fn write(&mut self, addr: u64, value: u64);
}
