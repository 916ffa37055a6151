//! Priority and group pickers.
//!
//! This module implements the scheduler's only arbitration mechanism. It provides:
//! 1. **Priority Picker:** Single-winner selection over a request vector; the
//!    lowest set index always wins.
//! 2. **Group Picker:** Independent read and write lanes, the write lane gated by
//!    each unit's release request.

use crate::common::mask::Mask;

/// Stateless single-winner arbiter.
///
/// `grant[i] = req[i] & !(req[0] | ... | req[i-1])`.
#[derive(Clone, Copy, Debug, Default)]
pub struct PriorityPicker;

impl PriorityPicker {
    /// Returns a one-hot grant vector (or all zero) of the same width as `req`.
    pub fn pick(req: &Mask) -> Mask {
        let mut grant = Mask::new(req.width());
        if let Some(i) = req.first_one() {
            grant.set(i, true);
        }
        grant
    }

    /// Index of the winning request, if any.
    pub fn winner(req: &Mask) -> Option<usize> {
        req.first_one()
    }
}

/// Grants produced by one evaluation of a [`GroupPicker`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupGrant {
    /// One-hot operand read grant.
    pub go_read: Mask,
    /// One-hot result write grant.
    pub go_write: Mask,
}

/// Read/write lane arbiter for one group of FUs.
#[derive(Clone, Copy, Debug, Default)]
pub struct GroupPicker;

impl GroupPicker {
    /// Evaluates both lanes.
    ///
    /// # Arguments
    ///
    /// * `readable` - FUs whose operands are free to read.
    /// * `writable` - FUs whose destination is free to write.
    /// * `release_request` - FUs holding a valid result.
    ///
    /// # Returns
    ///
    /// The read and write grants. The lanes are independent and may select
    /// different FUs in the same tick.
    pub fn pick(readable: &Mask, writable: &Mask, release_request: &Mask) -> GroupGrant {
        let write_candidates = writable.and(release_request);
        GroupGrant {
            go_read: PriorityPicker::pick(readable),
            go_write: PriorityPicker::pick(&write_candidates),
        }
    }
}
