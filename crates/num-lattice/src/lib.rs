#![forbid(unsafe_code)]
//! Lattice value domains for fixsolve
//!
//! Small, concrete domains used by the fixsolve test suite and examples:
//!
//! - [`ExtInt`] - integers extended with `-inf` and `+inf`, totally
//!   ordered, with saturating addition and `max` as the upper bound
//! - [`IntSet`] - finite sets of integers under set inclusion, with union
//!   as the upper bound
//!
//! Production analyses bring their own domains; these exist so that
//! solvers and drivers can be exercised against values with the right
//! algebraic shape (a total order with infinities for widening tests, a
//! powerset for dataflow tests) without dragging in a real abstract
//! interpreter.

use std::fmt;
use std::ops::Add;

use num_traits::{Bounded, Zero};
use rustc_hash::FxHashSet;

use fixsolve::{Magma, PreOrdered, UpperBound};

/// An integer extended with two infinities.
///
/// The derived ordering is `NegInf < Fin(_) < PosInf` with finite values
/// compared as usual.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExtInt {
    /// Below every integer.
    NegInf,
    /// A finite value.
    Fin(i64),
    /// Above every integer.
    PosInf,
}

impl ExtInt {
    /// The smaller of `self` and `other`.
    #[inline]
    pub fn min(self, other: ExtInt) -> ExtInt {
        Ord::min(self, other)
    }

    /// The larger of `self` and `other`.
    #[inline]
    pub fn max(self, other: ExtInt) -> ExtInt {
        Ord::max(self, other)
    }

    /// The finite value, if any.
    pub fn finite(self) -> Option<i64> {
        match self {
            ExtInt::Fin(n) => Some(n),
            _ => None,
        }
    }
}

impl From<i64> for ExtInt {
    fn from(n: i64) -> Self {
        ExtInt::Fin(n)
    }
}

impl Add for ExtInt {
    type Output = ExtInt;

    /// Saturating addition: any `NegInf` operand wins, then any `PosInf`.
    fn add(self, other: ExtInt) -> ExtInt {
        match (self, other) {
            (ExtInt::NegInf, _) | (_, ExtInt::NegInf) => ExtInt::NegInf,
            (ExtInt::PosInf, _) | (_, ExtInt::PosInf) => ExtInt::PosInf,
            (ExtInt::Fin(a), ExtInt::Fin(b)) => ExtInt::Fin(a.saturating_add(b)),
        }
    }
}

impl Zero for ExtInt {
    fn zero() -> Self {
        ExtInt::Fin(0)
    }

    fn is_zero(&self) -> bool {
        matches!(self, ExtInt::Fin(0))
    }
}

impl Bounded for ExtInt {
    fn min_value() -> Self {
        ExtInt::NegInf
    }

    fn max_value() -> Self {
        ExtInt::PosInf
    }
}

impl PreOrdered for ExtInt {
    #[inline]
    fn lteq(&self, other: &Self) -> bool {
        self <= other
    }
}

impl UpperBound for ExtInt {
    #[inline]
    fn upper_bound(&self, other: &Self) -> Self {
        (*self).max(*other)
    }
}

impl Magma for ExtInt {
    #[inline]
    fn magma_combine(&self, other: &Self) -> Self {
        (*self).max(*other)
    }
}

impl fmt::Display for ExtInt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtInt::NegInf => write!(f, "-inf"),
            ExtInt::Fin(n) => write!(f, "{n}"),
            ExtInt::PosInf => write!(f, "+inf"),
        }
    }
}

/// A finite set of integers, ordered by inclusion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IntSet(FxHashSet<u32>);

impl IntSet {
    /// The empty set.
    pub fn empty() -> Self {
        IntSet(FxHashSet::default())
    }

    /// The set of the given elements.
    pub fn of(items: impl IntoIterator<Item = u32>) -> Self {
        IntSet(items.into_iter().collect())
    }

    /// Whether `n` is in the set.
    pub fn contains(&self, n: u32) -> bool {
        self.0.contains(&n)
    }

    /// The number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The union of the two sets.
    pub fn union(&self, other: &IntSet) -> IntSet {
        IntSet(self.0.union(&other.0).copied().collect())
    }

    /// The elements of `self` not in `other`.
    pub fn minus(&self, other: &IntSet) -> IntSet {
        IntSet(self.0.difference(&other.0).copied().collect())
    }
}

impl PreOrdered for IntSet {
    fn lteq(&self, other: &Self) -> bool {
        self.0.is_subset(&other.0)
    }
}

impl UpperBound for IntSet {
    fn upper_bound(&self, other: &Self) -> Self {
        self.union(other)
    }
}

impl Magma for IntSet {
    fn magma_combine(&self, other: &Self) -> Self {
        self.union(other)
    }
}

impl fmt::Display for IntSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut items: Vec<u32> = self.0.iter().copied().collect();
        items.sort_unstable();
        write!(f, "{{")?;
        for (i, n) in items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{n}")?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extint_orders_with_infinities() {
        assert!(ExtInt::NegInf < ExtInt::Fin(i64::MIN));
        assert!(ExtInt::Fin(i64::MAX) < ExtInt::PosInf);
        assert!(ExtInt::Fin(1).lteq(&ExtInt::Fin(2)));
        assert_eq!(ExtInt::min_value(), ExtInt::NegInf);
    }

    #[test]
    fn extint_addition_saturates() {
        assert_eq!(ExtInt::NegInf + ExtInt::Fin(5), ExtInt::NegInf);
        assert_eq!(ExtInt::PosInf + ExtInt::Fin(5), ExtInt::PosInf);
        assert_eq!(ExtInt::NegInf + ExtInt::PosInf, ExtInt::NegInf);
        assert_eq!(ExtInt::Fin(2) + ExtInt::Fin(3), ExtInt::Fin(5));
        assert!(ExtInt::zero().is_zero());
    }

    #[test]
    fn intset_is_a_powerset_lattice() {
        let a = IntSet::of([1, 2]);
        let b = IntSet::of([2, 3]);
        assert!(a.lteq(&a.union(&b)));
        assert!(b.lteq(&a.union(&b)));
        assert_eq!(a.union(&b), IntSet::of([1, 2, 3]));
        assert_eq!(a.minus(&b), IntSet::of([1]));
        assert_eq!(a.union(&b).to_string(), "{1, 2, 3}");
    }
}
