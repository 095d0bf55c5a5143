//! Worklist fixpoint solver
//!
//! Keeps a FIFO queue of unknowns whose equation may be out of date. When
//! popping `u` produces a new value, every unknown influenced by `u` is
//! enqueued again (duplicates suppressed). Termination relies on the
//! influence relation honoring the locality contract of
//! [`FiniteEquationSystem`].

use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::core::assignment::{Assignment, MapAssignment, MutableAssignment};
use crate::eqs::finite::FiniteEquationSystem;
use crate::solvers::tracer::FixpointSolverTracer;

/// Solve `eqs` starting from `start` with a FIFO worklist.
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
    let infl = eqs.infl();
    let mut current = eqs.mutable_assignment(Rc::clone(start));
    tracer.initialized(&current);

    let mut queue: VecDeque<U> = VecDeque::new();
    let mut queued: FxHashSet<U> = FxHashSet::default();
    for u in eqs.unknowns() {
        if queued.insert(u.clone()) {
            queue.push_back(u.clone());
        }
    }

    while let Some(u) = queue.pop_front() {
        queued.remove(&u);
        let newval = body(&current, &u);
        tracer.evaluated(&current, &u, &newval);
        if newval != current.get(&u) {
            current.update(u.clone(), newval);
            for v in infl.image(&u) {
                if queued.insert(v.clone()) {
                    queue.push_back(v.clone());
                }
            }
        }
    }

    tracer.completed(&current);
    current
}
