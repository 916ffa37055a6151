//! Set/reset latch primitive.
//!
//! `HazardCell` is the single bit every dependency matrix, shadow set and
//! computation-unit latch is built from. Its next state is a pure function of
//! the current value and the two pulses: `set` wins when both fire.

/// One set/reset memory bit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct HazardCell {
    q: bool,
}

impl HazardCell {
    /// A cleared cell.
    pub const fn new() -> Self {
        Self { q: false }
    }

    /// Current (latched) value.
    #[inline]
    pub const fn get(self) -> bool {
        self.q
    }

    /// Next-state function: `set ? 1 : (reset ? 0 : q)`.
    #[inline]
    pub const fn next(self, set: bool, reset: bool) -> bool {
        set || (!reset && self.q)
    }

    /// Commits the next state. Called once per tick in the latch phase.
    #[inline]
    pub const fn update(&mut self, set: bool, reset: bool) {
        self.q = self.next(set, reset);
    }
}
