//! Core types of the equation-system algebra
//!
//! This module contains the building blocks everything else is assembled
//! from:
//! - `domain` - the abstract operations a value domain exposes
//! - `assignment` - total maps from unknowns to values, mutable and not
//! - `combo` - binary value combinators (widening, narrowing, warrowing)
//! - `combo_assignment` - partial maps from unknowns to combos

pub mod assignment;
pub mod combo;
pub mod combo_assignment;
pub mod domain;

// Public re-exports (for external API)
pub use assignment::{
    Assignment, ConditionalAssignment, ConstantAssignment, FnAssignment, MapAssignment,
    MutableAssignment,
};
pub use combo::{BoxCombo, Combo};
pub use combo_assignment::{BoxComboAssignment, ComboAssignment};
pub use domain::{Magma, PreOrdered, UpperBound};
