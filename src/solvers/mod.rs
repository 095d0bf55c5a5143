//! Fixpoint solvers
//!
//! All solvers share one contract: given an equation system and an initial
//! assignment, return a mutable assignment `rho` with
//! `rho(u) == body(rho)(u)` for every unknown the solve covered, reporting
//! through `unknowns()` exactly the unknowns it wrote. They differ only in
//! iteration strategy:
//!
//! - `round_robin` - sweep all unknowns until stable
//! - `kleene` - sweep with updates deferred to the next sweep
//! - `worklist` - FIFO scheduling along the influence relation
//! - `priority_worklist` - scheduling by an unknown ordering, with an
//!   optional restart policy
//! - `hierarchical` - walk a weak topological ordering, iterating each
//!   component to stability
//! - `infinite_worklist`, `infinite_priority_worklist` - local solvers
//!   that discover the reachable unknowns of an infinite system
//!
//! Termination is the caller's bargain: it is guaranteed only when the
//! value domain has no infinite ascending chains or when widening combos
//! are installed at every loop head.

pub mod hierarchical;
pub mod infinite_priority_worklist;
pub mod infinite_worklist;
pub mod kleene;
pub mod priority_worklist;
pub mod round_robin;
pub mod tracer;
pub mod worklist;

// Public re-exports (for external API)
pub use infinite_priority_worklist::{DynamicPriority, UnknownPriority};
pub use tracer::{
    trace_enabled, DebugSolverTracer, FixpointSolverTracer, NoopSolverTracer,
    PerformanceSolverTracer,
};
