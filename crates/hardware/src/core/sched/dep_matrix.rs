//! Register dependency matrix.
//!
//! One [`HazardGrid`] per operand port, rows indexed by FU slot and columns by
//! register. A cell means "FU *r* holds an outstanding claim on register *c*
//! through this port". It provides:
//! 1. **Claims:** Set from the decoded register masks when a FU issues.
//! 2. **Release:** Source cells reset on `go_read`, destination cells on `go_write`;
//!    every port resets on die.
//! 3. **Pending vectors:** Per-FU and per-register OR reductions.
//! 4. **Register select:** The `ren`/`wen` masks driven to the register file.

use super::grid::HazardGrid;
use super::issue::DecodedRegs;
use crate::common::mask::Mask;

/// Operand port of the register matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Port {
    /// Destination (write) port.
    Dest,
    /// First source (read) port.
    Src1,
    /// Second source (read) port.
    Src2,
}

impl Port {
    /// Both read ports, in register-file port order.
    pub const READ: [Self; 2] = [Self::Src1, Self::Src2];
}

/// FU × register claims for every operand port.
#[derive(Clone, Debug)]
pub struct RegDepMatrix {
    dest: HazardGrid,
    src1: HazardGrid,
    src2: HazardGrid,
}

impl RegDepMatrix {
    /// Creates an empty matrix for `num_fus` slots and `num_regs` registers.
    pub fn new(num_fus: usize, num_regs: usize) -> Self {
        Self {
            dest: HazardGrid::new(num_fus, num_regs),
            src1: HazardGrid::new(num_fus, num_regs),
            src2: HazardGrid::new(num_fus, num_regs),
        }
    }

    /// Grid backing one port.
    pub const fn grid(&self, port: Port) -> &HazardGrid {
        match port {
            Port::Dest => &self.dest,
            Port::Src1 => &self.src1,
            Port::Src2 => &self.src2,
        }
    }

    /// `true` if FU `fu` holds any claim on any port.
    pub fn row_pending(&self, fu: usize) -> bool {
        self.dest.row_pending(fu) || self.src1.row_pending(fu) || self.src2.row_pending(fu)
    }

    /// FUs that still have an unread source operand.
    pub fn read_pending_fus(&self) -> Mask {
        self.src1.row_pending_vec().or(&self.src2.row_pending_vec())
    }

    /// Registers some FU still has to read.
    pub fn read_pending_regs(&self) -> Mask {
        self.src1.col_pending_vec().or(&self.src2.col_pending_vec())
    }

    /// Registers some FU has yet to write.
    pub fn write_pending_regs(&self) -> Mask {
        self.dest.col_pending_vec()
    }

    /// FUs holding a destination claim on any register in `regs`.
    pub fn writers_of(&self, regs: &Mask) -> Mask {
        self.dest.rows_touching(regs)
    }

    /// FUs holding an unread source claim on any register in `regs`.
    pub fn readers_of(&self, regs: &Mask) -> Mask {
        self.src1
            .rows_touching(regs)
            .or(&self.src2.rows_touching(regs))
    }

    /// Register read enables for one read port: the source row of every FU
    /// granted `go_read` this tick.
    pub fn ren(&self, port: Port, go_read: &Mask) -> Mask {
        self.grid(port).select_rows(go_read)
    }

    /// Register write enables: the destination row of the FU granted `go_write`.
    pub fn wen(&self, go_write: &Mask) -> Mask {
        self.dest.select_rows(go_write)
    }

    /// Latch phase.
    ///
    /// # Arguments
    ///
    /// * `issue` - Slot and decoded registers of this tick's issue, if any.
    /// * `src_reset` - FUs whose source claims release (`go_read` or die).
    /// * `dest_reset` - FUs whose destination claims release (`go_write`, completion or die).
    pub fn latch(
        &mut self,
        issue: Option<(usize, &DecodedRegs)>,
        src_reset: &Mask,
        dest_reset: &Mask,
    ) {
        let (dest_set, src1_set, src2_set) = issue.map_or_else(
            || (Vec::new(), Vec::new(), Vec::new()),
            |(fu, regs)| {
                (
                    vec![(fu, regs.dest.clone())],
                    vec![(fu, regs.src1.clone())],
                    vec![(fu, regs.src2.clone())],
                )
            },
        );
        self.dest.update(&dest_set, dest_reset, None);
        self.src1.update(&src1_set, src_reset, None);
        self.src2.update(&src2_set, src_reset, None);
    }
}
