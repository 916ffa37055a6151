//! Architectural register file.
//!
//! This module provides the `RegisterFile` struct, the external storage the
//! scheduler reads on `go_read` and writes on `go_write`. It provides:
//! 1. **Storage:** A flat vector of registers sized from the configuration.
//! 2. **Width masking:** Every write is truncated to the configured register width.
//! 3. **Port access:** Bulk read/write driven by the scheduler's `ren`/`wen` masks.
//! 4. **Observability:** A dump helper for end-of-run reporting.

use super::mask::Mask;

/// Register file of `num_regs` registers, each `width` bits wide.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterFile {
    regs: Vec<u64>,
    width: u32,
}

impl RegisterFile {
    /// Creates a register file with all registers initialized to zero.
    ///
    /// # Arguments
    ///
    /// * `num_regs` - Number of registers.
    /// * `width` - Register width in bits (`1..=64`).
    pub fn new(num_regs: usize, width: u32) -> Self {
        Self {
            regs: vec![0; num_regs],
            width,
        }
    }

    /// Creates a register file holding `values`, masked to `width`.
    pub fn with_values(values: &[u64], width: u32) -> Self {
        let mut rf = Self::new(values.len(), width);
        for (i, v) in values.iter().enumerate() {
            rf.write(i, *v);
        }
        rf
    }

    /// Number of registers.
    pub fn len(&self) -> usize {
        self.regs.len()
    }

    /// `true` if the file holds no registers.
    pub fn is_empty(&self) -> bool {
        self.regs.is_empty()
    }

    /// Configured register width in bits.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Bit mask covering the register width.
    pub const fn value_mask(&self) -> u64 {
        width_mask(self.width)
    }

    /// Reads register `idx`. Out-of-range reads return zero.
    pub fn read(&self, idx: usize) -> u64 {
        self.regs.get(idx).copied().unwrap_or(0)
    }

    /// Writes register `idx`, truncating to the register width.
    /// Out-of-range writes are ignored.
    pub fn write(&mut self, idx: usize, val: u64) {
        let mask = self.value_mask();
        if let Some(slot) = self.regs.get_mut(idx) {
            *slot = val & mask;
        }
    }

    /// Reads the single register selected by a one-hot read-enable mask.
    pub fn read_port(&self, ren: &Mask) -> Option<u64> {
        ren.first_one().map(|idx| self.read(idx))
    }

    /// Writes `val` into every register selected by the write-enable mask.
    pub fn write_port(&mut self, wen: &Mask, val: u64) {
        for idx in wen.iter_ones() {
            self.write(idx, val);
        }
    }

    /// Snapshot of all register values.
    pub fn values(&self) -> &[u64] {
        &self.regs
    }

    /// Dumps the register file in rows of four.
    pub fn dump(&self) {
        for (row, chunk) in self.regs.chunks(4).enumerate() {
            let line: Vec<String> = chunk
                .iter()
                .enumerate()
                .map(|(i, v)| format!("r{:<2} = {:#018x}", row * 4 + i, v))
                .collect();
            println!("  {}", line.join("  "));
        }
    }
}

/// Mask of the low `width` bits (`width` in `1..=64`).
pub const fn width_mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}
