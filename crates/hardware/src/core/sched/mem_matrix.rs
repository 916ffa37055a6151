//! Load/store ordering matrix.
//!
//! Memory ordering between load/store slots, using the same cell primitive as
//! the FU-FU matrix. At issue a load is ordered behind every outstanding store,
//! and a store behind every outstanding load or store. A hold only blocks while
//! the two effective addresses may alias: [`AddrMatch`] compares the word
//! index bits of each computed address, and a slot whose address is not yet
//! known matches everything.

use super::grid::HazardGrid;
use crate::common::mask::Mask;

/// FU × FU memory ordering cells.
#[derive(Clone, Debug)]
pub struct MemDepMatrix {
    wait: HazardGrid,
}

impl MemDepMatrix {
    /// Creates an empty matrix for `num_fus` slots.
    pub fn new(num_fus: usize) -> Self {
        Self {
            wait: HazardGrid::new(num_fus, num_fus),
        }
    }

    /// Slots not ordered behind any outstanding memory operation that may
    /// touch the same word.
    ///
    /// # Arguments
    ///
    /// * `matches` - Per slot, the slots whose addresses may alias it (see
    ///   [`AddrMatch::matrix`]).
    pub fn clear(&self, matches: &[Mask]) -> Mask {
        let n = self.wait.rows();
        let held = (0..n).filter(|&fu| self.wait.row(fu).intersects(&matches[fu]));
        Mask::from_indices(n, held).not()
    }

    /// `true` if slot `fu` waits on an older memory operation.
    pub fn row_pending(&self, fu: usize) -> bool {
        self.wait.row_pending(fu)
    }

    /// Older memory operations a new load or store must wait for.
    ///
    /// # Arguments
    ///
    /// * `is_store` - The issuing instruction is a store.
    /// * `loads` - Outstanding loads that survive this tick.
    /// * `stores` - Outstanding stores that survive this tick.
    pub fn capture(is_store: bool, loads: &Mask, stores: &Mask) -> Mask {
        if is_store {
            loads.or(stores)
        } else {
            stores.clone()
        }
    }

    /// Latch phase. `retire` holds completing and dying slots.
    pub fn latch(&mut self, issue: Option<(usize, &Mask)>, retire: &Mask) {
        let set: Vec<(usize, Mask)> = issue.map(|(fu, m)| (fu, m.clone())).into_iter().collect();
        self.wait.update(&set, retire, Some(retire));
    }
}

/// Partial address comparator over the word-index bits of a memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AddrMatch {
    index_mask: u64,
}

impl AddrMatch {
    /// Comparator for a power-of-two memory of `words` words. Addresses are
    /// taken modulo the size, so only the low index bits take part.
    pub const fn new(words: usize) -> Self {
        Self {
            index_mask: (words as u64).wrapping_sub(1),
        }
    }

    /// `true` if `a` and `b` select the same word.
    pub const fn aliases(&self, a: u64, b: u64) -> bool {
        (a ^ b) & self.index_mask == 0
    }

    /// For every slot, the slots it may conflict with.
    ///
    /// `addrs[fu]` is the effective address of slot `fu`, or `None` while it is
    /// unknown. An unknown address on either side counts as a match.
    pub fn matrix(&self, addrs: &[Option<u64>]) -> Vec<Mask> {
        let n = addrs.len();
        addrs
            .iter()
            .map(|mine| {
                Mask::from_indices(
                    n,
                    (0..n).filter(|&other| match (mine, addrs[other]) {
                        (Some(a), Some(b)) => self.aliases(*a, b),
                        _ => true,
                    }),
                )
            })
            .collect()
    }
}
