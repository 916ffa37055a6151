//! Runtime-width bit masks.
//!
//! Every per-FU and per-register signal vector in the scheduler (request,
//! grant, pending, busy, shadow) is a `Mask`. The width is fixed when the
//! mask is built from the configuration and never changes afterwards; all
//! binary operations require both operands to have the same width.

use std::fmt;

use bitvec::order::Lsb0;
use bitvec::vec::BitVec;

type Bits = BitVec<u64, Lsb0>;

/// A fixed-width bit vector indexed by FU slot or register number.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Mask(Bits);

impl Mask {
    /// Creates an all-zero mask of `width` bits.
    pub fn new(width: usize) -> Self {
        Self(Bits::repeat(false, width))
    }

    /// Creates an all-one mask of `width` bits.
    pub fn ones(width: usize) -> Self {
        Self(Bits::repeat(true, width))
    }

    /// Creates a mask of `width` bits with the given indices set.
    ///
    /// Indices outside the width are ignored.
    pub fn from_indices<I>(width: usize, indices: I) -> Self
    where
        I: IntoIterator<Item = usize>,
    {
        let mut mask = Self::new(width);
        for i in indices {
            if i < width {
                mask.set(i, true);
            }
        }
        mask
    }

    /// Creates a one-hot mask with only `index` set.
    pub fn one_hot(width: usize, index: usize) -> Self {
        Self::from_indices(width, [index])
    }

    /// Number of bits in the mask.
    pub fn width(&self) -> usize {
        self.0.len()
    }

    /// Returns bit `i`, or `false` when `i` is out of range.
    pub fn get(&self, i: usize) -> bool {
        self.0.get(i).is_some_and(|b| *b)
    }

    /// Sets bit `i` to `value`.
    ///
    /// # Panics
    ///
    /// Panics if `i` is out of range.
    pub fn set(&mut self, i: usize, value: bool) {
        self.0.set(i, value);
    }

    /// Clears every bit.
    pub fn clear(&mut self) {
        self.0.fill(false);
    }

    /// `true` if any bit is set.
    pub fn any(&self) -> bool {
        self.0.any()
    }

    /// `true` if no bit is set.
    pub fn none(&self) -> bool {
        self.0.not_any()
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.0.count_ones()
    }

    /// Index of the lowest set bit.
    pub fn first_one(&self) -> Option<usize> {
        self.0.first_one()
    }

    /// Iterates the indices of set bits in ascending order.
    pub fn iter_ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter_ones()
    }

    /// Bitwise AND.
    #[must_use]
    pub fn and(&self, other: &Self) -> Self {
        debug_assert_eq!(self.width(), other.width(), "mask width mismatch");
        let mut out = self.0.clone();
        out &= other.0.as_bitslice();
        Self(out)
    }

    /// Bitwise OR.
    #[must_use]
    pub fn or(&self, other: &Self) -> Self {
        debug_assert_eq!(self.width(), other.width(), "mask width mismatch");
        let mut out = self.0.clone();
        out |= other.0.as_bitslice();
        Self(out)
    }

    /// Bits set in `self` but not in `other`.
    #[must_use]
    pub fn and_not(&self, other: &Self) -> Self {
        self.and(&other.not())
    }

    /// Bitwise complement.
    #[must_use]
    pub fn not(&self) -> Self {
        Self(!self.0.clone())
    }

    /// In-place OR.
    pub fn or_assign(&mut self, other: &Self) {
        debug_assert_eq!(self.width(), other.width(), "mask width mismatch");
        self.0 |= other.0.as_bitslice();
    }

    /// `true` if `self` and `other` share at least one set bit.
    pub fn intersects(&self, other: &Self) -> bool {
        self.iter_ones().any(|i| other.get(i))
    }
}

impl fmt::Debug for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mask({self})")
    }
}

/// Most significant bit first, like a hardware signal dump.
impl fmt::Display for Mask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.0.iter().by_vals().rev() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}
