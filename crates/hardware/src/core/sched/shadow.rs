//! Shadow matrix and branch speculation record.
//!
//! This module tracks which in-flight operations may not yet retire. It provides:
//! 1. **Shadow function:** One shadow latch per FU slot, set at issue, cleared on
//!    confirm or die, raising `go_die` when its governing condition fails.
//! 2. **Branch speculation record:** Per-slot "depends on taken / not taken" bits
//!    plus the single active branch and its outcome.
//! 3. **Order shadow:** A FU × FU chain linking each slot to the slot issued just
//!    before it, so results retire in issue order and a die follows the chain.
//!
//! A plain `go_*` pulse never clears a branch shadow bit; only resolution or die does.

use serde::{Deserialize, Serialize};

use super::grid::HazardGrid;
use super::latch::HazardCell;
use crate::common::mask::Mask;

/// Predicted branch direction an instruction depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Prediction {
    /// Valid only if the branch is taken.
    Taken,
    /// Valid only if the branch is not taken.
    NotTaken,
}

impl Prediction {
    /// `true` if this prediction agrees with the resolved outcome.
    pub const fn matches(self, taken: bool) -> bool {
        match self {
            Self::Taken => taken,
            Self::NotTaken => !taken,
        }
    }
}

/// One shadow bit for one FU slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShadowFn {
    q: HazardCell,
}

impl ShadowFn {
    /// `true` while the slot is held in the shadow.
    pub const fn shadowed(self) -> bool {
        self.q.get()
    }

    /// Die request: the shadow is held and its condition failed.
    pub const fn go_die(self, fail: bool) -> bool {
        self.q.get() && fail
    }

    /// Latch phase. `shadow_issue` sets; `good` (confirm) or `reset` (die) clears.
    pub const fn update(&mut self, shadow_issue: bool, good: bool, reset: bool) {
        self.q.update(shadow_issue, good || reset);
    }
}

/// Per-slot branch dependence plus the single outstanding branch.
#[derive(Clone, Debug)]
pub struct BranchSpeculationRecord {
    depends_on_taken: Vec<HazardCell>,
    depends_on_not_taken: Vec<HazardCell>,
    branch_active: bool,
    branch_fu: Option<usize>,
    branch_outcome: Option<bool>,
}

impl BranchSpeculationRecord {
    /// Creates an idle record for `num_fus` slots.
    pub fn new(num_fus: usize) -> Self {
        Self {
            depends_on_taken: vec![HazardCell::new(); num_fus],
            depends_on_not_taken: vec![HazardCell::new(); num_fus],
            branch_active: false,
            branch_fu: None,
            branch_outcome: None,
        }
    }

    /// `true` while a branch is issued and unresolved.
    pub const fn branch_active(&self) -> bool {
        self.branch_active
    }

    /// Slot executing the active branch.
    pub const fn branch_fu(&self) -> Option<usize> {
        self.branch_fu
    }

    /// Outcome of the most recently resolved branch.
    pub const fn branch_outcome(&self) -> Option<bool> {
        self.branch_outcome
    }

    /// Recorded dependence of slot `fu`, if any.
    pub fn dependence(&self, fu: usize) -> Option<Prediction> {
        if self.depends_on_taken.get(fu).is_some_and(|c| c.get()) {
            Some(Prediction::Taken)
        } else if self.depends_on_not_taken.get(fu).is_some_and(|c| c.get()) {
            Some(Prediction::NotTaken)
        } else {
            None
        }
    }

    /// Compares the outcome against slot `fu`'s recorded dependence.
    ///
    /// # Returns
    ///
    /// `(match_good, match_fail)`: exactly one is true for a slot with a
    /// recorded dependence, neither for a slot without one.
    pub fn matches(&self, fu: usize, taken: bool) -> (bool, bool) {
        self.dependence(fu)
            .map_or((false, false), |p| (p.matches(taken), !p.matches(taken)))
    }

    fn update(&mut self, fu: usize, tag: Option<Prediction>, reset: bool) {
        let (t, nt) = match tag {
            Some(Prediction::Taken) => (true, false),
            Some(Prediction::NotTaken) => (false, true),
            None => (false, false),
        };
        self.depends_on_taken[fu].update(t, reset);
        self.depends_on_not_taken[fu].update(nt, reset);
    }
}

/// Outcome partition of one branch resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Resolved direction.
    pub taken: bool,
    /// Slots whose dependence matched: shadow clears.
    pub confirm: Mask,
    /// Slots whose dependence contradicted the outcome: die.
    pub kill: Mask,
}

/// Issue-time shadow request for one slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadowIssue {
    /// Issuing slot.
    pub fu: usize,
    /// Order predecessor chosen by [`ShadowMatrix::issue_predecessor`].
    pub pred: Option<usize>,
    /// Branch dependence of the instruction.
    pub tag: Option<Prediction>,
    /// The instruction is itself a branch and opens a new speculation record.
    pub is_branch: bool,
}

/// Everything the shadow matrix commits in one latch phase.
#[derive(Clone, Debug)]
pub struct ShadowLatch<'a> {
    /// This tick's issue, if any.
    pub issue: Option<ShadowIssue>,
    /// Branch resolution, if the branch slot wrote this tick.
    pub resolution: Option<&'a Resolution>,
    /// Final die set.
    pub die: &'a Mask,
    /// Slots completing normally this tick.
    pub retire: &'a Mask,
    /// `(slot, new predecessor)` re-links for survivors whose predecessor dies.
    pub splices: &'a [(usize, usize)],
}

/// Branch and order shadows for every FU slot.
#[derive(Clone, Debug)]
pub struct ShadowMatrix {
    branch: Vec<ShadowFn>,
    record: BranchSpeculationRecord,
    order: HazardGrid,
    last_issued: Option<usize>,
    order_enabled: bool,
}

impl ShadowMatrix {
    /// Creates an empty shadow matrix.
    ///
    /// # Arguments
    ///
    /// * `num_fus` - Number of FU slots.
    /// * `order_enabled` - Link each issue to its predecessor.
    pub fn new(num_fus: usize, order_enabled: bool) -> Self {
        Self {
            branch: vec![ShadowFn::default(); num_fus],
            record: BranchSpeculationRecord::new(num_fus),
            order: HazardGrid::new(num_fus, num_fus),
            last_issued: None,
            order_enabled,
        }
    }

    /// The speculation record.
    pub const fn record(&self) -> &BranchSpeculationRecord {
        &self.record
    }

    /// Slots held by the branch shadow.
    pub fn branch_shadowed(&self) -> Mask {
        let shadowed = self
            .branch
            .iter()
            .enumerate()
            .filter(|(_, s)| s.shadowed())
            .map(|(i, _)| i);
        Mask::from_indices(self.branch.len(), shadowed)
    }

    /// Slots held by the order shadow.
    pub fn order_shadowed(&self) -> Mask {
        self.order.row_pending_vec()
    }

    /// `shadown`: slots free of every shadow, allowed to retire.
    pub fn shadow_free(&self) -> Mask {
        self.branch_shadowed().or(&self.order_shadowed()).not()
    }

    /// Order predecessor of slot `fu`.
    pub fn order_pred(&self, fu: usize) -> Option<usize> {
        self.order.row(fu).first_one()
    }

    /// Number of order predecessors recorded for slot `fu` (0 or 1 when healthy).
    pub fn order_fan_in(&self, fu: usize) -> usize {
        self.order.row(fu).count()
    }

    /// `true` if slot `fu` holds any shadow bit.
    pub fn row_pending(&self, fu: usize) -> bool {
        self.branch.get(fu).is_some_and(|s| s.shadowed()) || self.order.row_pending(fu)
    }

    /// Partitions the branch-shadowed slots by the resolved direction.
    pub fn resolve(&self, taken: bool) -> Resolution {
        let shadowed = self.branch_shadowed();
        let mut confirm = Mask::new(shadowed.width());
        let mut kill = Mask::new(shadowed.width());
        for fu in shadowed.iter_ones() {
            let (good, fail) = self.record.matches(fu, taken);
            if self.branch[fu].go_die(fail) {
                kill.set(fu, true);
            } else if good {
                confirm.set(fu, true);
            }
        }
        Resolution {
            taken,
            confirm,
            kill,
        }
    }

    /// Closes a die seed over the shadow relations.
    ///
    /// A dying branch slot takes its whole branch shadow with it, and a dying
    /// slot takes every order successor that is not being confirmed this tick.
    pub fn die_closure(&self, seed: &Mask, confirm: &Mask, busy: &Mask) -> Mask {
        let mut die = seed.and(busy);
        let shadowed = self.branch_shadowed();
        loop {
            let mut changed = false;
            if let Some(b) = self.record.branch_fu
                && self.record.branch_active
                && die.get(b)
            {
                for fu in shadowed.iter_ones() {
                    if !die.get(fu) {
                        die.set(fu, true);
                        changed = true;
                    }
                }
            }
            for fu in busy.iter_ones() {
                if die.get(fu) || confirm.get(fu) {
                    continue;
                }
                if self.order_pred(fu).is_some_and(|p| die.get(p)) {
                    die.set(fu, true);
                    changed = true;
                }
            }
            if !changed {
                return die;
            }
        }
    }

    /// Walks back from `fu` to the first slot that survives this tick.
    ///
    /// Stops at a retiring slot (everything before it has already drained).
    fn surviving_ancestor(&self, fu: usize, die: &Mask, retire: &Mask) -> Option<usize> {
        let mut cur = fu;
        for _ in 0..self.branch.len() {
            if retire.get(cur) {
                return None;
            }
            if !die.get(cur) {
                return Some(cur);
            }
            cur = self.order_pred(cur)?;
        }
        None
    }

    /// Re-links survivors whose order predecessor dies this tick.
    pub fn splices(&self, die: &Mask, retire: &Mask, busy: &Mask) -> Vec<(usize, usize)> {
        busy.iter_ones()
            .filter(|&fu| !die.get(fu) && !retire.get(fu))
            .filter_map(|fu| {
                let pred = self.order_pred(fu)?;
                if !die.get(pred) {
                    return None;
                }
                self.surviving_ancestor(pred, die, retire).map(|anc| (fu, anc))
            })
            .collect()
    }

    /// Order predecessor for an instruction issuing this tick: the most recent
    /// issue that is still busy and survives the tick.
    pub fn issue_predecessor(&self, busy: &Mask, die: &Mask, retire: &Mask) -> Option<usize> {
        if !self.order_enabled {
            return None;
        }
        let last = self.last_issued.filter(|&fu| busy.get(fu))?;
        self.surviving_ancestor(last, die, retire)
    }

    /// Latch phase.
    pub fn latch(&mut self, l: &ShadowLatch<'_>) {
        let n = self.branch.len();
        let confirm = l.resolution.map_or_else(|| Mask::new(n), |r| r.confirm.clone());
        let clear = l.die.or(l.retire);

        for fu in 0..n {
            let issue = l.issue.filter(|i| i.fu == fu);
            let tag = issue.and_then(|i| i.tag);
            let reset = clear.get(fu) || confirm.get(fu);
            self.branch[fu].update(tag.is_some(), confirm.get(fu), clear.get(fu));
            self.record.update(fu, tag, reset);
        }

        let mut sets: Vec<(usize, Mask)> = l
            .splices
            .iter()
            .map(|&(fu, anc)| (fu, Mask::one_hot(n, anc)))
            .collect();
        if let Some(ShadowIssue { fu, pred: Some(p), .. }) = l.issue {
            sets.push((fu, Mask::one_hot(n, p)));
        }
        self.order.update(&sets, &clear, Some(&clear));

        if let Some(r) = l.resolution {
            self.record.branch_active = false;
            self.record.branch_fu = None;
            self.record.branch_outcome = Some(r.taken);
        } else if self.record.branch_fu.is_some_and(|b| l.die.get(b)) {
            self.record.branch_active = false;
            self.record.branch_fu = None;
        }
        if let Some(issue) = l.issue {
            if issue.is_branch {
                self.record.branch_active = true;
                self.record.branch_fu = Some(issue.fu);
                self.record.branch_outcome = None;
            }
            self.last_issued = Some(issue.fu);
        }
    }
}
