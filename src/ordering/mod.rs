//! Orderings of unknowns
//!
//! Priority-driven solvers and combo placement both need a total ordering
//! of the unknowns enriched with the notion of a *head*: an unknown that
//! closes a loop of the influence graph and is therefore where widenings
//! belong.
//!
//! - [`DFOrdering`] numbers the unknowns by a depth-first exploration of
//!   the influence graph and detects heads as targets of retreating edges;
//! - [`HierarchicalOrdering`] refines an ordering into a parenthesized
//!   (weak topological) sequence consumed by the hierarchical solver.

pub mod dfo;
pub mod hierarchical;

use std::cmp::Ordering;

pub use dfo::{DFOrdering, InfluenceType};
pub use hierarchical::{HOElement, HierarchicalOrdering};

/// A total ordering of an equation system's unknowns, with loop heads.
pub trait UnknownOrdering<U> {
    /// Compare two unknowns of the system.
    fn compare(&self, x: &U, y: &U) -> Ordering;

    /// Whether `u` is a loop head.
    fn is_head(&self, u: &U) -> bool;

    /// All unknowns, smallest first.
    fn to_seq(&self) -> Vec<U>;

    /// Whether `x <= y`.
    #[inline]
    fn lteq(&self, x: &U, y: &U) -> bool {
        self.compare(x, y) != Ordering::Greater
    }

    /// Whether `x < y`.
    #[inline]
    fn lt(&self, x: &U, y: &U) -> bool {
        self.compare(x, y) == Ordering::Less
    }

    /// Whether `x > y`.
    #[inline]
    fn gt(&self, x: &U, y: &U) -> bool {
        self.compare(x, y) == Ordering::Greater
    }
}
