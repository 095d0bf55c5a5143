//! Error types for equation-system construction and driving
//!
//! This module provides `FixError`, the single error enum surfaced by the
//! crate. Fixpoint iteration itself is infallible: solver loops either
//! terminate with a solution or diverge, and user callbacks (bodies, combos,
//! tracers) are trusted, so their panics propagate unchanged. Errors arise
//! only while assembling the pieces: validating a hierarchical-ordering
//! sequence, pairing a solver with an ordering it cannot consume, or reading
//! a partial assignment outside its domain.

use std::fmt;

/// Errors raised while building orderings, assignments, or driver runs.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FixError {
    /// A hierarchical-ordering sequence is not well formed.
    InvalidSequence {
        /// Description of the structural defect.
        msg: String,
    },
    /// Localized combo application was requested on a system that carries no
    /// graph structure to localize over.
    LocalizationRequiresGraph,
    /// A solver was paired with an ordering of the wrong shape.
    OrderingMismatch {
        /// The solver that rejected the ordering.
        solver: String,
        /// What the solver requires.
        required: String,
    },
    /// A map-backed assignment with no fallback was read outside its domain.
    UndefinedUnknown {
        /// Rendering of the unknown that was requested.
        unknown: String,
    },
}

impl FixError {
    /// Create an `InvalidSequence` error.
    pub fn invalid_sequence(msg: impl Into<String>) -> Self {
        FixError::InvalidSequence { msg: msg.into() }
    }

    /// Create an `OrderingMismatch` error.
    pub fn ordering_mismatch(solver: impl Into<String>, required: impl Into<String>) -> Self {
        FixError::OrderingMismatch {
            solver: solver.into(),
            required: required.into(),
        }
    }

    /// Create an `UndefinedUnknown` error.
    pub fn undefined_unknown(unknown: impl fmt::Debug) -> Self {
        FixError::UndefinedUnknown {
            unknown: format!("{unknown:?}"),
        }
    }
}

impl fmt::Display for FixError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FixError::InvalidSequence { msg } => {
                write!(f, "Invalid hierarchical ordering sequence: {msg}")
            }
            FixError::LocalizationRequiresGraph => {
                write!(f, "Localized combos require a graph-based equation system")
            }
            FixError::OrderingMismatch { solver, required } => {
                write!(f, "Solver '{solver}' requires {required}")
            }
            FixError::UndefinedUnknown { unknown } => {
                write!(f, "Assignment is undefined at unknown {unknown}")
            }
        }
    }
}

impl std::error::Error for FixError {}
