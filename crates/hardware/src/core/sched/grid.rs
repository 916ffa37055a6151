//! Two-dimensional arrays of hazard cells.
//!
//! `HazardGrid` is the storage shared by the register matrix (FU × register),
//! the FU-FU matrix (FU × FU), the order shadow and the memory ordering matrix.
//! Pending vectors are derived on demand from the latched cells and never stored.

use super::latch::HazardCell;
use crate::common::mask::Mask;

/// Row-major grid of [`HazardCell`]s.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HazardGrid {
    rows: usize,
    cols: usize,
    cells: Vec<HazardCell>,
}

impl HazardGrid {
    /// Creates a cleared `rows × cols` grid.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![HazardCell::new(); rows * cols],
        }
    }

    /// Row count.
    pub const fn rows(&self) -> usize {
        self.rows
    }

    /// Column count.
    pub const fn cols(&self) -> usize {
        self.cols
    }

    /// Latched value of cell `(r, c)`.
    pub fn get(&self, r: usize, c: usize) -> bool {
        r < self.rows && c < self.cols && self.cells[r * self.cols + c].get()
    }

    /// Row `r` as a column-indexed mask.
    pub fn row(&self, r: usize) -> Mask {
        Mask::from_indices(self.cols, (0..self.cols).filter(|&c| self.get(r, c)))
    }

    /// Column `c` as a row-indexed mask.
    pub fn col(&self, c: usize) -> Mask {
        Mask::from_indices(self.rows, (0..self.rows).filter(|&r| self.get(r, c)))
    }

    /// `true` if any cell in row `r` is set.
    pub fn row_pending(&self, r: usize) -> bool {
        (0..self.cols).any(|c| self.get(r, c))
    }

    /// OR over each row, indexed by row.
    pub fn row_pending_vec(&self) -> Mask {
        Mask::from_indices(self.rows, (0..self.rows).filter(|&r| self.row_pending(r)))
    }

    /// OR over each column, indexed by column.
    pub fn col_pending_vec(&self) -> Mask {
        let mut out = Mask::new(self.cols);
        for r in 0..self.rows {
            for c in 0..self.cols {
                if self.get(r, c) {
                    out.set(c, true);
                }
            }
        }
        out
    }

    /// Rows with a set cell in any of the `cols` columns.
    pub fn rows_touching(&self, cols: &Mask) -> Mask {
        let touching = (0..self.rows).filter(|&r| cols.iter_ones().any(|c| self.get(r, c)));
        Mask::from_indices(self.rows, touching)
    }

    /// OR of the rows selected by `rows`, indexed by column.
    pub fn select_rows(&self, rows: &Mask) -> Mask {
        let mut out = Mask::new(self.cols);
        for r in rows.iter_ones() {
            out.or_assign(&self.row(r));
        }
        out
    }

    /// Latch phase: commits every cell exactly once.
    ///
    /// # Arguments
    ///
    /// * `set` - `(row, columns)` pairs to set this tick.
    /// * `reset_rows` - Rows whose every cell resets (go pulse or die on that row's FU).
    /// * `reset_cols` - Columns whose every cell resets, for grids indexed by FU on both axes.
    pub fn update(&mut self, set: &[(usize, Mask)], reset_rows: &Mask, reset_cols: Option<&Mask>) {
        for r in 0..self.rows {
            let set_row = set.iter().find(|(row, _)| *row == r).map(|(_, m)| m);
            for c in 0..self.cols {
                let s = set_row.is_some_and(|m| m.get(c));
                let rst = reset_rows.get(r) || reset_cols.is_some_and(|m| m.get(c));
                self.cells[r * self.cols + c].update(s, rst);
            }
        }
    }

    /// Clears every cell.
    pub fn clear(&mut self) {
        self.cells.fill(HazardCell::new());
    }
}
