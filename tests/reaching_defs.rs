//! Reaching definitions for the textbook seven-statement do-while program
//! (Aho, Sethi, Ullman): every finite solver must compute the same known
//! solution.

use std::rc::Rc;

use num_lattice::IntSet;

use fixsolve::core::assignment;
use fixsolve::eqs::body::Body;
use fixsolve::solvers::NoopSolverTracer;
use fixsolve::solvers::{hierarchical, kleene, priority_worklist, round_robin, worklist};
use fixsolve::{Assignment, DFOrdering, FiniteEquationSystem, HierarchicalOrdering, Relation};

/// out(u) = gen(u) + (in(u) - kill(u)), with the do-while back edge
/// feeding statement 4 from statement 7.
fn body() -> Body<u32, IntSet> {
    Rc::new(|rho, u| match u {
        1 => IntSet::of([1]),
        2 => IntSet::of([2]).union(&rho.get(&1).minus(&IntSet::of([5]))),
        3 => IntSet::of([3]).union(&rho.get(&2).minus(&IntSet::of([6]))),
        4 => IntSet::of([4]).union(
            &rho.get(&3)
                .union(&rho.get(&7))
                .minus(&IntSet::of([1, 7])),
        ),
        5 => IntSet::of([5]).union(&rho.get(&4).minus(&IntSet::of([2]))),
        6 => IntSet::of([6]).union(&rho.get(&5).minus(&IntSet::of([3]))),
        _ => IntSet::of([7]).union(
            &rho.get(&5)
                .union(&rho.get(&6))
                .minus(&IntSet::of([1, 4])),
        ),
    })
}

fn system() -> FiniteEquationSystem<u32, IntSet> {
    FiniteEquationSystem::new(
        body(),
        Relation::from_pairs([(1, 2), (2, 3), (3, 4), (4, 5), (5, 6), (5, 7), (6, 7), (7, 4)]),
        (1..=7).collect(),
        [1],
    )
}

fn expected() -> Vec<(u32, IntSet)> {
    vec![
        (1, IntSet::of([1])),
        (2, IntSet::of([1, 2])),
        (3, IntSet::of([1, 2, 3])),
        (4, IntSet::of([2, 3, 4, 5, 6])),
        (5, IntSet::of([3, 4, 5, 6])),
        (6, IntSet::of([4, 5, 6])),
        (7, IntSet::of([3, 5, 6, 7])),
    ]
}

fn check(rho: &dyn Assignment<u32, IntSet>) {
    for (u, defs) in expected() {
        assert_eq!(rho.get(&u), defs, "solution at statement {u}");
    }
}

#[test]
fn round_robin_finds_the_known_solution() {
    let eqs = system();
    let rho = round_robin::solve(&eqs, &assignment::constant(IntSet::empty()), &NoopSolverTracer);
    check(&rho);
}

#[test]
fn kleene_finds_the_known_solution() {
    let eqs = system();
    let rho = kleene::solve(&eqs, &assignment::constant(IntSet::empty()), &NoopSolverTracer);
    check(&rho);
}

#[test]
fn worklist_finds_the_known_solution() {
    let eqs = system();
    let rho = worklist::solve(&eqs, &assignment::constant(IntSet::empty()), &NoopSolverTracer);
    check(&rho);
}

#[test]
fn priority_worklist_finds_the_known_solution() {
    let eqs = system();
    let dfo = DFOrdering::of(&eqs);
    let rho = priority_worklist::solve(
        &eqs,
        &assignment::constant(IntSet::empty()),
        &dfo,
        &|_, _| false,
        &NoopSolverTracer,
    );
    check(&rho);
}

#[test]
fn hierarchical_finds_the_known_solution() {
    let eqs = system();
    let ho = HierarchicalOrdering::from_ordering(&DFOrdering::of(&eqs));
    let rho = hierarchical::solve(
        &eqs,
        &assignment::constant(IntSet::empty()),
        &ho,
        &NoopSolverTracer,
    );
    check(&rho);
}

#[test]
fn the_fixpoint_property_holds_pointwise() {
    let eqs = system();
    let rho = worklist::solve(&eqs, &assignment::constant(IntSet::empty()), &NoopSolverTracer);
    let body = eqs.body();
    for u in eqs.unknowns() {
        assert_eq!(body(&rho, u), rho.get(u));
    }
}
