//! Randomized properties: every solver computes the same fixpoint of a
//! monotone system, repeated runs are identical, and the ordering
//! analyses agree with the influence graph they were built from.

use std::rc::Rc;

use quickcheck::quickcheck;

use crate::core::assignment::{self, Assignment, MutableAssignment};
use crate::core::combo;
use crate::core::combo_assignment;
use crate::eqs::body::Body;
use crate::eqs::finite::FiniteEquationSystem;
use crate::eqs::relation::Relation;
use crate::ordering::dfo::DFOrdering;
use crate::ordering::hierarchical::HierarchicalOrdering;
use crate::ordering::UnknownOrdering;
use crate::solvers::tracer::NoopSolverTracer;
use crate::solvers::{hierarchical, kleene, priority_worklist, round_robin, worklist};

const NODES: u8 = 8;
const CAP: i64 = 7;

fn normalize(edges: &[(u8, u8)]) -> Vec<(u8, u8)> {
    let mut seen = Vec::new();
    for &(a, b) in edges {
        let e = (a % NODES, b % NODES);
        if !seen.contains(&e) {
            seen.push(e);
        }
    }
    seen
}

/// A monotone, bounded system over 8 unknowns: each unknown is one more
/// than the largest of its predecessors, capped, so every solver
/// terminates and the least fixpoint is unique.
fn system_from_edges(edges: &[(u8, u8)]) -> FiniteEquationSystem<u8, i64> {
    let edges = normalize(edges);
    let preds = Rc::new(edges.clone());
    let body: Body<u8, i64> = Rc::new(move |rho, u| {
        preds
            .iter()
            .filter(|e| e.1 == *u)
            .map(|e| (rho.get(&e.0) + 1).min(CAP))
            .fold(0, i64::max)
    });
    FiniteEquationSystem::new(
        body,
        Relation::from_pairs(edges),
        (0..NODES).collect(),
        [0],
    )
}

fn values(rho: &dyn Assignment<u8, i64>) -> Vec<i64> {
    (0..NODES).map(|u| rho.get(&u)).collect()
}

quickcheck! {
    fn all_solvers_agree_on_the_least_fixpoint(edges: Vec<(u8, u8)>) -> bool {
        let eqs = system_from_edges(&edges);
        let start = assignment::constant::<u8, i64>(0);
        let dfo = DFOrdering::of(&eqs);
        let ho = HierarchicalOrdering::from_ordering(&dfo);

        let rr = values(&round_robin::solve(&eqs, &start, &NoopSolverTracer));
        let kl = values(&kleene::solve(&eqs, &start, &NoopSolverTracer));
        let wl = values(&worklist::solve(&eqs, &start, &NoopSolverTracer));
        let pw = values(&priority_worklist::solve(
            &eqs, &start, &dfo, &|_, _| false, &NoopSolverTracer,
        ));
        let hi = values(&hierarchical::solve(&eqs, &start, &ho, &NoopSolverTracer));

        rr == kl && rr == wl && rr == pw && rr == hi
    }

    fn solving_twice_is_byte_identical(edges: Vec<(u8, u8)>) -> bool {
        let eqs = system_from_edges(&edges);
        let start = assignment::constant::<u8, i64>(0);
        let a = worklist::solve(&eqs, &start, &NoopSolverTracer);
        let b = worklist::solve(&eqs, &start, &NoopSolverTracer);
        let mut ua = a.unknowns();
        let mut ub = b.unknowns();
        ua.sort_unstable();
        ub.sort_unstable();
        ua == ub && values(&a) == values(&b)
    }

    fn the_result_is_a_fixpoint(edges: Vec<(u8, u8)>) -> bool {
        let eqs = system_from_edges(&edges);
        let rho = worklist::solve(
            &eqs,
            &assignment::constant::<u8, i64>(0),
            &NoopSolverTracer,
        );
        let body = eqs.body();
        eqs.unknowns().iter().all(|u| body(&rho, u) == rho.get(u))
    }

    fn reported_unknowns_really_changed(edges: Vec<(u8, u8)>) -> bool {
        let eqs = system_from_edges(&edges);
        let rho = worklist::solve(
            &eqs,
            &assignment::constant::<u8, i64>(0),
            &NoopSolverTracer,
        );
        // the start is constant 0 and values only grow, so every written
        // unknown must hold a value different from its start value
        rho.unknowns().iter().all(|u| rho.get(u) != 0)
    }

    fn empty_combos_do_not_change_the_solution(edges: Vec<(u8, u8)>) -> bool {
        let eqs = system_from_edges(&edges);
        let layered = eqs.with_combos(combo_assignment::empty());
        let start = assignment::constant::<u8, i64>(0);
        let plain = values(&worklist::solve(&eqs, &start, &NoopSolverTracer));
        let with = values(&worklist::solve(&layered, &start, &NoopSolverTracer));
        plain == with
    }

    fn retreating_influences_target_heads(edges: Vec<(u8, u8)>) -> bool {
        let edges = normalize(&edges);
        let infl = Relation::from_pairs(edges.iter().copied());
        let unknowns: Vec<u8> = (0..NODES).collect();
        let dfo = DFOrdering::new(&unknowns, [&0].into_iter(), &infl);
        edges.iter().all(|(u, v)| {
            dfo.compare(v, u) == std::cmp::Ordering::Greater || dfo.is_head(v)
        })
    }

    fn every_head_closes_some_loop(edges: Vec<(u8, u8)>) -> bool {
        let edges = normalize(&edges);
        let infl = Relation::from_pairs(edges.iter().copied());
        let unknowns: Vec<u8> = (0..NODES).collect();
        let dfo = DFOrdering::new(&unknowns, [&0].into_iter(), &infl);
        dfo.heads().iter().all(|h| {
            edges
                .iter()
                .any(|(u, v)| v == h && dfo.compare(v, u) != std::cmp::Ordering::Greater)
        })
    }

    fn refined_hierarchical_orderings_validate(edges: Vec<(u8, u8)>) -> bool {
        let eqs = system_from_edges(&edges);
        let ho = HierarchicalOrdering::from_ordering(&DFOrdering::of(&eqs));
        // the literal sequence parses back, and heads open parentheses
        HierarchicalOrdering::from_sequence(ho.elements().to_vec()).is_ok()
    }

    fn cascades_clone_to_equivalent_fresh_combos(delay: u8, pairs: Vec<(i64, i64)>) -> bool {
        let delay = usize::from(delay % 8);
        let mut original = combo::cascade(
            combo::right::<i64>(),
            delay,
            combo::from_fn(|x, y| x + y, false),
        );
        let outputs: Vec<i64> = pairs.iter().map(|(x, y)| original.apply(x, y)).collect();
        // cloned after running, yet it must behave like a pristine copy
        let mut copy = original.clone_box();
        let copied: Vec<i64> = pairs.iter().map(|(x, y)| copy.apply(x, y)).collect();
        outputs == copied
    }
}
