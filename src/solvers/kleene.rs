//! Kleene iteration solver
//!
//! Like the round-robin solver, but updates computed during a sweep only
//! become visible in the next sweep: every sweep evaluates all bodies in
//! the previous sweep's assignment, then the two assignments swap roles.
//! This is the textbook Kleene iteration sequence, useful when the order
//! of unknowns must not influence intermediate assignments.

use std::rc::Rc;

use crate::core::assignment::{Assignment, MapAssignment, MutableAssignment};
use crate::eqs::finite::FiniteEquationSystem;
use crate::solvers::tracer::FixpointSolverTracer;

/// Solve `eqs` starting from `start` by Kleene iteration.
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
        // writes go to a copy so that this sweep reads a frozen assignment
        let mut next = current.clone();
        for u in eqs.unknowns() {
            let newval = body(&current, u);
            tracer.evaluated(&current, u, &newval);
            if newval != current.get(u) {
                next.update(u.clone(), newval);
                dirty = true;
            }
        }
        current = next;
    }

    tracer.completed(&current);
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assignment;
    use crate::eqs::body::Body;
    use crate::eqs::relation::Relation;
    use crate::solvers::tracer::NoopSolverTracer;

    #[test]
    fn sweeps_do_not_see_their_own_updates() {
        // body(0) = 1, body(1) = rho(0): with frozen sweeps, unknown 1
        // still converges, one sweep later than round-robin would
        let body: Body<i32, i64> = Rc::new(|rho, u| if *u == 0 { 1 } else { rho.get(&0) });
        let eqs = FiniteEquationSystem::new(
            body,
            Relation::from_pairs([(0, 1)]),
            vec![0, 1],
            [0],
        );
        let rho = solve(
            &eqs,
            &assignment::constant::<i32, i64>(0),
            &NoopSolverTracer,
        );
        assert_eq!(rho.get(&0), 1);
        assert_eq!(rho.get(&1), 1);
    }
}
