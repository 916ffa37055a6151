//! FU-FU dependency matrix.
//!
//! Rows and columns are both FU slots; cell `(r, c)` means "FU *r* may not
//! proceed past some phase until FU *c*, issued earlier, releases". Three
//! grids carry the three register hazards, a fourth holds the diagonal
//! occupancy cell so every busy slot owns at least one set cell.
//!
//! | grid      | hazard | blocks row's | column resets on |
//! |-----------|--------|--------------|------------------|
//! | `rd_wait` | RAW    | `go_read`    | `go_write`       |
//! | `wr_wait` | WAR    | `go_write`   | `go_read`        |
//! | `ww_wait` | WAW    | `go_write`   | `go_write`       |

use super::dep_matrix::RegDepMatrix;
use super::grid::HazardGrid;
use super::issue::DecodedRegs;
use crate::common::mask::Mask;

/// Ordering dependencies captured for one issuing FU, each indexed by FU.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FuCapture {
    /// Earlier writers of this FU's sources.
    pub rd_wait: Mask,
    /// Earlier FUs that have not yet read this FU's destination.
    pub wr_wait: Mask,
    /// Earlier writers of this FU's destination.
    pub ww_wait: Mask,
}

impl FuCapture {
    /// Derives the dependencies of a new instruction from the latched register claims.
    ///
    /// FUs in `releasing_write` (write grant or die this tick) and
    /// `releasing_read` (read grant or die this tick) are left out, so no cell is
    /// set in the same tick its column resets.
    pub fn capture(
        claims: &RegDepMatrix,
        regs: &DecodedRegs,
        releasing_read: &Mask,
        releasing_write: &Mask,
    ) -> Self {
        let sources = regs.src1.or(&regs.src2);
        Self {
            rd_wait: claims.writers_of(&sources).and_not(releasing_write),
            wr_wait: claims.readers_of(&regs.dest).and_not(releasing_read),
            ww_wait: claims.writers_of(&regs.dest).and_not(releasing_write),
        }
    }
}

/// FU × FU ordering matrix.
#[derive(Clone, Debug)]
pub struct FuDepMatrix {
    rd_wait: HazardGrid,
    wr_wait: HazardGrid,
    ww_wait: HazardGrid,
    occupied: HazardGrid,
}

impl FuDepMatrix {
    /// Creates an empty matrix for `num_fus` slots.
    pub fn new(num_fus: usize) -> Self {
        Self {
            rd_wait: HazardGrid::new(num_fus, num_fus),
            wr_wait: HazardGrid::new(num_fus, num_fus),
            ww_wait: HazardGrid::new(num_fus, num_fus),
            occupied: HazardGrid::new(num_fus, num_fus),
        }
    }

    /// Slots whose source operands are not waiting on an earlier writer.
    pub fn read_clear(&self) -> Mask {
        self.rd_wait.row_pending_vec().not()
    }

    /// Slots whose result is not ordered behind an earlier read or write.
    pub fn write_clear(&self) -> Mask {
        self.wr_wait
            .row_pending_vec()
            .or(&self.ww_wait.row_pending_vec())
            .not()
    }

    /// Slots holding their diagonal occupancy cell.
    #[cfg(test)]
    pub(crate) fn occupied(&self) -> Mask {
        self.occupied.row_pending_vec()
    }

    /// `true` if any cell in FU `fu`'s row is set.
    pub fn row_pending(&self, fu: usize) -> bool {
        self.rd_wait.row_pending(fu)
            || self.wr_wait.row_pending(fu)
            || self.ww_wait.row_pending(fu)
            || self.occupied.row_pending(fu)
    }

    /// FUs that FU `fu` waits on before reading.
    pub fn read_waits(&self, fu: usize) -> Mask {
        self.rd_wait.row(fu)
    }

    /// FUs that FU `fu` waits on before writing.
    pub fn write_waits(&self, fu: usize) -> Mask {
        self.wr_wait.row(fu).or(&self.ww_wait.row(fu))
    }

    /// Latch phase.
    ///
    /// # Arguments
    ///
    /// * `issue` - Issuing slot and its captured dependencies.
    /// * `go_read` - Read grants this tick.
    /// * `go_write` - Write grants this tick.
    /// * `retire` - Slots completing (write, store) or dying this tick.
    /// * `die` - Slots dying this tick.
    pub fn latch(
        &mut self,
        issue: Option<(usize, &FuCapture)>,
        go_read: &Mask,
        go_write: &Mask,
        retire: &Mask,
        die: &Mask,
    ) {
        let n = self.occupied.rows();
        let (rd, wr, ww, occ) = issue.map_or_else(
            || (Vec::new(), Vec::new(), Vec::new(), Vec::new()),
            |(fu, cap)| {
                (
                    vec![(fu, cap.rd_wait.clone())],
                    vec![(fu, cap.wr_wait.clone())],
                    vec![(fu, cap.ww_wait.clone())],
                    vec![(fu, Mask::one_hot(n, fu))],
                )
            },
        );
        let write_release = go_write.or(die);
        let read_release = go_read.or(die);
        self.rd_wait.update(&rd, retire, Some(&write_release));
        self.wr_wait.update(&wr, retire, Some(&read_release));
        self.ww_wait.update(&ww, retire, Some(&write_release));
        self.occupied.update(&occ, retire, None);
    }
}
