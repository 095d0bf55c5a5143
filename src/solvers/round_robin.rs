//! Round-robin fixpoint solver
//!
//! Sweeps all unknowns in declaration order, over and over, until a full
//! sweep changes nothing. Updates become visible immediately within the
//! sweep, which is what distinguishes this solver from the Kleene one.

use std::rc::Rc;

use crate::core::assignment::{Assignment, MapAssignment, MutableAssignment};
use crate::eqs::finite::FiniteEquationSystem;
use crate::solvers::tracer::FixpointSolverTracer;

/// Solve `eqs` starting from `start` by chaotic round-robin iteration.
///
/// Terminates when a whole sweep is stable; the returned assignment then
/// satisfies `rho(u) == body(rho)(u)` for every unknown of the system.
pub fn solve<U, V>(
    eqs: &FiniteEquationSystem<U, V>,
    start: &Rc<dyn Assignment<U, V>>,
    tracer: &dyn FixpointSolverTracer<U, V>,
) -> MapAssignment<U, V>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + PartialEq + 'static,
{
    let body = eqs.body();
    let mut current = eqs.mutable_assignment(Rc::clone(start));
    tracer.initialized(&current);

    let mut dirty = true;
    while dirty {
        dirty = false;
        for u in eqs.unknowns() {
            let newval = body(&current, u);
            tracer.evaluated(&current, u, &newval);
            if newval != current.get(u) {
                current.update(u.clone(), newval);
                dirty = true;
            }
        }
    }

    tracer.completed(&current);
    current
}
