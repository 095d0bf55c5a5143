//! Observers of solver progress
//!
//! A [`FixpointSolverTracer`] watches a solver from the outside: it is
//! told when the mutable assignment is set up, after each evaluation, when
//! the two-phase driver switches direction, and when the solve completes.
//! Tracers are passive; they must not mutate the assignment they are
//! shown.

use std::cell::Cell;
use std::fmt;

use crate::core::assignment::Assignment;

/// Callbacks around a fixpoint solve. All methods default to no-ops.
pub trait FixpointSolverTracer<U, V> {
    /// The solver set up its mutable assignment.
    fn initialized(&self, _rho: &dyn Assignment<U, V>) {}

    /// The solver evaluated the body of `u`, obtaining `newval`.
    fn evaluated(&self, _rho: &dyn Assignment<U, V>, _u: &U, _newval: &V) {}

    /// The solve terminated with `rho`.
    fn completed(&self, _rho: &dyn Assignment<U, V>) {}

    /// A two-phase driver starts its ascending phase.
    fn ascending_begins(&self, _rho: &dyn Assignment<U, V>) {}

    /// A two-phase driver starts its descending phase.
    fn descending_begins(&self, _rho: &dyn Assignment<U, V>) {}
}

/// The tracer that ignores everything.
#[derive(Clone, Copy, Default)]
pub struct NoopSolverTracer;

impl<U, V> FixpointSolverTracer<U, V> for NoopSolverTracer {}

/// A tracer printing every callback to standard error.
#[derive(Clone, Copy, Default)]
pub struct DebugSolverTracer;

impl<U: fmt::Debug, V: fmt::Debug> FixpointSolverTracer<U, V> for DebugSolverTracer {
    fn initialized(&self, _rho: &dyn Assignment<U, V>) {
        eprintln!("initialized");
    }

    fn evaluated(&self, _rho: &dyn Assignment<U, V>, u: &U, newval: &V) {
        eprintln!("evaluated {u:?} -> {newval:?}");
    }

    fn completed(&self, _rho: &dyn Assignment<U, V>) {
        eprintln!("completed");
    }

    fn ascending_begins(&self, _rho: &dyn Assignment<U, V>) {
        eprintln!("ascending phase begins");
    }

    fn descending_begins(&self, _rho: &dyn Assignment<U, V>) {
        eprintln!("descending phase begins");
    }
}

/// A tracer counting evaluations, for comparing solver behavior.
#[derive(Default)]
pub struct PerformanceSolverTracer {
    evaluations: Cell<u64>,
}

impl PerformanceSolverTracer {
    /// A tracer with its counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of evaluations observed so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations.get()
    }
}

impl<U, V> FixpointSolverTracer<U, V> for PerformanceSolverTracer {
    fn evaluated(&self, _rho: &dyn Assignment<U, V>, _u: &U, _newval: &V) {
        self.evaluations.set(self.evaluations.get() + 1);
    }
}

/// Whether verbose solver tracing was requested through the environment.
///
/// Checked by callers that want an optional debug tracer without wiring
/// one through their own configuration (set `FIXSOLVE_TRACE=1`).
pub fn trace_enabled() -> bool {
    std::env::var("FIXSOLVE_TRACE")
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
