//! Local priority worklist solver for infinite systems
//!
//! Identical to the infinite worklist solver except for its queue, which
//! pops the smallest pending unknown of an [`UnknownPriority`]. The
//! default [`DynamicPriority`] hands out strictly decreasing ranks on
//! first touch, so unknowns discovered later are evaluated before the
//! unknowns that discovered them; on self-referential systems this tends
//! to stabilize inner equations before outer ones re-run.
//!
//! Priorities are assigned at insertion, in a fixed touch order, which
//! keeps runs reproducible.

use std::collections::BTreeSet;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::assignment::{Assignment, MapAssignment, MutableAssignment};
use crate::eqs::system::EquationSystem;
use crate::solvers::tracer::FixpointSolverTracer;

/// A rank for every unknown, consulted when unknowns are enqueued.
///
/// Implementations may assign ranks lazily, but a given unknown must keep
/// its rank for the whole solve.
pub trait UnknownPriority<U> {
    /// The rank of `u`; smaller ranks pop first.
    fn priority(&mut self, u: &U) -> i64;
}

/// The default priority: each unknown gets a strictly smaller rank than
/// every unknown touched before it.
#[derive(Default)]
pub struct DynamicPriority<U> {
    ranks: FxHashMap<U, i64>,
    next: i64,
}

impl<U: Clone + Eq + std::hash::Hash> DynamicPriority<U> {
    /// A priority with no ranks assigned yet.
    pub fn new() -> Self {
        DynamicPriority {
            ranks: FxHashMap::default(),
            next: 0,
        }
    }
}

impl<U: Clone + Eq + std::hash::Hash> UnknownPriority<U> for DynamicPriority<U> {
    fn priority(&mut self, u: &U) -> i64 {
        if let Some(&rank) = self.ranks.get(u) {
            return rank;
        }
        self.next -= 1;
        self.ranks.insert(u.clone(), self.next);
        self.next
    }
}

/// Solve `eqs` locally around `wanted` with the default dynamic priority.
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
    solve_with_priority(eqs, start, wanted, DynamicPriority::new(), tracer)
}

/// Solve `eqs` locally around `wanted`, scheduling by `priority`.
pub fn solve_with_priority<U, V>(
    eqs: &EquationSystem<U, V>,
    start: &Rc<dyn Assignment<U, V>>,
    wanted: &[U],
    mut priority: impl UnknownPriority<U>,
    tracer: &dyn FixpointSolverTracer<U, V>,
) -> MapAssignment<U, V>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + PartialEq + 'static,
{
    let body = eqs.body_with_dependencies();
    let mut current = eqs.mutable_assignment(Rc::clone(start));
    let mut infl: FxHashMap<U, Vec<U>> = FxHashMap::default();

    // the queue holds ranks; ranks are unique per unknown
    let mut pending: BTreeSet<i64> = BTreeSet::new();
    let mut by_rank: FxHashMap<i64, U> = FxHashMap::default();
    let mut queued: FxHashSet<U> = FxHashSet::default();

    for u in wanted {
        if !current.is_defined_at(u) {
            current.update(u.clone(), start.get(u));
        }
        if queued.insert(u.clone()) {
            let rank = priority.priority(u);
            by_rank.insert(rank, u.clone());
            pending.insert(rank);
        }
    }
    tracer.initialized(&current);

    while let Some(rank) = pending.pop_first() {
        let Some(u) = by_rank.remove(&rank) else {
            continue;
        };
        queued.remove(&u);
        let (newval, deps) = body(&current, &u);
        tracer.evaluated(&current, &u, &newval);
        for dep in deps {
            if !current.is_defined_at(&dep) {
                current.update(dep.clone(), start.get(&dep));
                if queued.insert(dep.clone()) {
                    let r = priority.priority(&dep);
                    by_rank.insert(r, dep.clone());
                    pending.insert(r);
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
                        let r = priority.priority(v);
                        by_rank.insert(r, v.clone());
                        pending.insert(r);
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
    fn newest_unknowns_pop_first() {
        let mut prio = DynamicPriority::new();
        let first = prio.priority(&"a");
        let second = prio.priority(&"b");
        assert!(second < first);
        // ranks are stable
        assert_eq!(prio.priority(&"a"), first);
    }

    #[test]
    fn solves_a_discovered_chain() {
        let eqs = EquationSystem::from_fn(|rho: &dyn Assignment<i64, i64>, u| {
            if *u > 0 {
                rho.get(&(u - 1))
            } else {
                7
            }
        });
        let rho = solve(
            &eqs,
            &assignment::constant::<i64, i64>(0),
            &[4],
            &NoopSolverTracer,
        );
        let mut seen = rho.unknowns();
        seen.sort_unstable();
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);
        assert_eq!(rho.get(&4), 7);
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
