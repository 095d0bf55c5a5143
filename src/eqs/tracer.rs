//! Observers of body evaluation
//!
//! An [`EquationSystemTracer`] watches a composed body at work: it is told
//! before and after each right-hand-side evaluation, and additionally when
//! a combo rewrites the computed value. Tracers are passive; they must not
//! mutate the assignment they are shown.

use std::cell::Cell;
use std::fmt;

use crate::core::assignment::Assignment;

/// Callbacks around body evaluation. All methods default to no-ops.
pub trait EquationSystemTracer<U, V> {
    /// Called before the body of `u` is evaluated in `rho`.
    fn before_evaluation(&self, _rho: &dyn Assignment<U, V>, _u: &U) {}

    /// Called after the body of `u` evaluated to `res`.
    fn after_evaluation(&self, _rho: &dyn Assignment<U, V>, _u: &U, _res: &V) {}

    /// Called when the combo at `u` rewrote `res` into `comboed`.
    fn combo_evaluation(&self, _rho: &dyn Assignment<U, V>, _u: &U, _res: &V, _comboed: &V) {}
}

/// The tracer that ignores everything.
#[derive(Clone, Copy, Default)]
pub struct NoopEquationSystemTracer;

impl<U, V> EquationSystemTracer<U, V> for NoopEquationSystemTracer {}

/// A tracer printing every callback to standard error.
#[derive(Clone, Copy, Default)]
pub struct DebugEquationSystemTracer;

impl<U: fmt::Debug, V: fmt::Debug> EquationSystemTracer<U, V> for DebugEquationSystemTracer {
    fn before_evaluation(&self, _rho: &dyn Assignment<U, V>, u: &U) {
        eprintln!("evaluating at {u:?}");
    }

    fn after_evaluation(&self, _rho: &dyn Assignment<U, V>, u: &U, res: &V) {
        eprintln!("evaluated at {u:?} -> {res:?}");
    }

    fn combo_evaluation(&self, _rho: &dyn Assignment<U, V>, u: &U, res: &V, comboed: &V) {
        eprintln!("combo at {u:?}: {res:?} -> {comboed:?}");
    }
}

/// A tracer counting body and combo evaluations.
///
/// Useful to compare the work different solvers or orderings perform on the
/// same system.
#[derive(Default)]
pub struct PerformanceEquationSystemTracer {
    evaluations: Cell<u64>,
    combo_evaluations: Cell<u64>,
}

impl PerformanceEquationSystemTracer {
    /// A tracer with both counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of body evaluations observed so far.
    pub fn evaluations(&self) -> u64 {
        self.evaluations.get()
    }

    /// Number of combo applications observed so far.
    pub fn combo_evaluations(&self) -> u64 {
        self.combo_evaluations.get()
    }
}

impl<U, V> EquationSystemTracer<U, V> for PerformanceEquationSystemTracer {
    fn before_evaluation(&self, _rho: &dyn Assignment<U, V>, _u: &U) {
        self.evaluations.set(self.evaluations.get() + 1);
    }

    fn combo_evaluation(&self, _rho: &dyn Assignment<U, V>, _u: &U, _res: &V, _comboed: &V) {
        self.combo_evaluations.set(self.combo_evaluations.get() + 1);
    }
}
