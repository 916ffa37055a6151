//! System-wide register pending vectors.
//!
//! Purely combinational OR reduction of every FU's register claims, recomputed
//! each tick from latched state. FUs dying in the current tick are still
//! included; they drop out on the next tick once their cells have reset.

use super::dep_matrix::{Port, RegDepMatrix};
use crate::common::mask::Mask;

/// Per-register "someone claims this" vectors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlobalPending {
    /// Registers with an outstanding read claim.
    pub read: Mask,
    /// Registers with an outstanding write claim.
    pub write: Mask,
}

impl GlobalPending {
    /// Reduces the register matrix over all FU rows.
    pub fn compute(claims: &RegDepMatrix) -> Self {
        let dest = claims.grid(Port::Dest);
        let mut read = Mask::new(dest.cols());
        let mut write = Mask::new(dest.cols());
        for fu in 0..dest.rows() {
            write.or_assign(&dest.row(fu));
            for port in Port::READ {
                read.or_assign(&claims.grid(port).row(fu));
            }
        }
        Self { read, write }
    }

    /// `true` if register `reg` has a pending writer.
    pub fn write_pending(&self, reg: usize) -> bool {
        self.write.get(reg)
    }

    /// `true` if register `reg` has a pending reader.
    pub fn read_pending(&self, reg: usize) -> bool {
        self.read.get(reg)
    }
}
