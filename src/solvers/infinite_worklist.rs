//! Local worklist solver for infinite systems
//!
//! A general [`EquationSystem`] has no unknown list and no influence
//! relation, but it can still be solved *locally*: starting from a
//! non-empty set of wanted unknowns, the solver evaluates bodies through
//! [`EquationSystem::body_with_dependencies`], discovers the unknowns an
//! evaluation actually reads, initializes newly seen ones from `start`,
//! and grows its own influence map as it goes.
//!
//! The wanted unknowns are seeded into both the assignment and the queue
//! up front, so a wanted unknown whose equation stabilizes immediately is
//! still evaluated and still reported in the solution.

use std::collections::VecDeque;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::assignment::{Assignment, MapAssignment, MutableAssignment};
use crate::eqs::system::EquationSystem;
use crate::solvers::tracer::FixpointSolverTracer;

/// Solve `eqs` locally around `wanted`, starting from `start`.
///
/// The returned assignment is defined (and reported by `unknowns`) exactly
/// on the unknowns the solve touched: the wanted ones and everything their
/// equations transitively read.
pub fn solve<U, V>(
    eqs: &EquationSystem<U, V>,
    start: &Rc<dyn Assignment<U, V>>,
    wanted: &[U],
    tracer: &dyn FixpointSolverTracer<U, V>,
) -> MapAssignment<U, V>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + PartialEq + 'static,
{
    let body = eqs.body_with_dependencies();
    let mut current = eqs.mutable_assignment(Rc::clone(start));
    let mut infl: FxHashMap<U, Vec<U>> = FxHashMap::default();

    let mut queue: VecDeque<U> = VecDeque::new();
    let mut queued: FxHashSet<U> = FxHashSet::default();
    for u in wanted {
        if !current.is_defined_at(u) {
            current.update(u.clone(), start.get(u));
        }
        if queued.insert(u.clone()) {
            queue.push_back(u.clone());
        }
    }
    tracer.initialized(&current);

    while let Some(u) = queue.pop_front() {
        queued.remove(&u);
        let (newval, deps) = body(&current, &u);
        tracer.evaluated(&current, &u, &newval);
        for dep in deps {
            if !current.is_defined_at(&dep) {
                // an unknown seen for the first time: give it its start
                // value and schedule its own equation
                current.update(dep.clone(), start.get(&dep));
                if queued.insert(dep.clone()) {
                    queue.push_back(dep.clone());
                }
            }
            let influenced = infl.entry(dep).or_default();
            if !influenced.contains(&u) {
                influenced.push(u.clone());
            }
        }
        if newval != current.get(&u) {
            current.update(u.clone(), newval);
            if let Some(influenced) = infl.get(&u) {
                for v in influenced {
                    if queued.insert(v.clone()) {
                        queue.push_back(v.clone());
                    }
                }
            }
        }
    }

    tracer.completed(&current);
    current
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assignment;
    use crate::solvers::tracer::NoopSolverTracer;

    #[test]
    fn discovers_the_reachable_subsystem() {
        // body(x) = rho(x - 1) for x > 0, else 1: wanting 3 discovers 0..=3
        let eqs = EquationSystem::from_fn(|rho: &dyn Assignment<i64, i64>, u| {
            if *u > 0 {
                rho.get(&(u - 1))
            } else {
                1
            }
        });
        let rho = solve(
            &eqs,
            &assignment::constant::<i64, i64>(0),
            &[3],
            &NoopSolverTracer,
        );
        let mut seen = rho.unknowns();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3]);
        for u in 0..=3 {
            assert_eq!(rho.get(&u), 1);
        }
    }

    #[test]
    fn immediately_stable_wanted_unknowns_are_kept() {
        let eqs = EquationSystem::from_fn(|_rho: &dyn Assignment<i64, i64>, _u| 1_i64);
        let rho = solve(
            &eqs,
            &assignment::constant::<i64, i64>(0),
            &[0],
            &NoopSolverTracer,
        );
        assert_eq!(rho.unknowns(), vec![0]);
        assert_eq!(rho.get(&0), 1);
    }
}
