//! Graph-based equation systems
//!
//! In a [`GraphBody`] the right-hand side of an unknown is not a black-box
//! closure but the combination of per-edge contributions: each ingoing
//! edge is evaluated by `edge_action` and the results are reduced with
//! `combiner`. Exposing this structure buys two things a plain finite
//! system cannot offer:
//!
//! - dependencies and influences are read off the edges instead of being
//!   observed through instrumentation,
//! - combos can be *localized*, applied inside the edge action on
//!   loop-closing edges only, which keeps widening losses confined to the
//!   edges that actually close loops.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::assignment::Assignment;
use crate::core::combo_assignment::BoxComboAssignment;
use crate::core::domain::{PreOrdered, UpperBound};
use crate::eqs::body::{Body, BodyWithDeps};
use crate::eqs::finite::FiniteEquationSystem;
use crate::eqs::relation::Relation;
use crate::ordering::UnknownOrdering;

/// The edge structure a graph body is generated from.
pub struct GraphBody<U, V, E> {
    /// The value an edge contributes, given the current assignment.
    pub edge_action: Rc<dyn Fn(&dyn Assignment<U, V>, &E) -> V>,
    /// The unknowns an edge reads.
    pub sources: Rc<dyn Fn(&E) -> Vec<U>>,
    /// The unknown an edge contributes to.
    pub target: Rc<dyn Fn(&E) -> U>,
    /// The edges leaving an unknown.
    pub outgoing: Rc<dyn Fn(&U) -> Vec<E>>,
    /// The edges entering an unknown.
    pub ingoing: Rc<dyn Fn(&U) -> Vec<E>>,
    /// How edge contributions are reduced, typically the upper bound.
    pub combiner: Rc<dyn Fn(&V, &V) -> V>,
}

impl<U, V, E> Clone for GraphBody<U, V, E> {
    fn clone(&self) -> Self {
        GraphBody {
            edge_action: Rc::clone(&self.edge_action),
            sources: Rc::clone(&self.sources),
            target: Rc::clone(&self.target),
            outgoing: Rc::clone(&self.outgoing),
            ingoing: Rc::clone(&self.ingoing),
            combiner: Rc::clone(&self.combiner),
        }
    }
}

impl<U, V, E> GraphBody<U, V, E>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + 'static,
    E: 'static,
{
    /// The body generated by the graph: at `u`, the reduction of the
    /// ingoing edge contributions, or `rho(u)` when no edge enters `u`.
    pub fn body(&self) -> Body<U, V> {
        let g = self.clone();
        Rc::new(move |rho, u| {
            let mut acc: Option<V> = None;
            for e in (g.ingoing)(u) {
                let contrib = (g.edge_action)(rho, &e);
                acc = Some(match acc {
                    Some(prev) => (g.combiner)(&prev, &contrib),
                    None => contrib,
                });
            }
            match acc {
                Some(v) => v,
                None => rho.get(u),
            }
        })
    }

    /// The dependency-reporting body, with dependencies read off the
    /// edges: the sources of every ingoing edge, in edge order.
    pub fn body_with_dependencies(&self) -> BodyWithDeps<U, V> {
        let body = self.body();
        let g = self.clone();
        Rc::new(move |rho, u| {
            let res = body(rho, u);
            let mut deps = Vec::new();
            for e in (g.ingoing)(u) {
                deps.extend((g.sources)(&e));
            }
            (res, deps)
        })
    }

    /// The influence relation read off the edges: `u` influences the
    /// targets of its outgoing edges.
    pub fn infl(&self, unknowns: &[U]) -> Relation<U> {
        let mut pairs = Vec::new();
        for u in unknowns {
            for e in (self.outgoing)(u) {
                pairs.push((u.clone(), (self.target)(&e)));
            }
        }
        Relation::from_pairs(pairs)
    }
}

/// A finite equation system generated from a graph.
pub struct GraphEquationSystem<U, V, E> {
    graph: GraphBody<U, V, E>,
    fin: FiniteEquationSystem<U, V>,
}

impl<U: Clone, V, E> Clone for GraphEquationSystem<U, V, E> {
    fn clone(&self) -> Self {
        GraphEquationSystem {
            graph: self.graph.clone(),
            fin: self.fin.clone(),
        }
    }
}

impl<U, V, E> GraphEquationSystem<U, V, E>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + 'static,
    E: 'static,
{
    /// The system generated by `graph` over the given unknowns.
    pub fn new(
        graph: GraphBody<U, V, E>,
        unknowns: Vec<U>,
        input_unknowns: impl IntoIterator<Item = U>,
    ) -> Self {
        let body = graph.body();
        let infl = graph.infl(&unknowns);
        let fin = FiniteEquationSystem::new(body, infl, unknowns, input_unknowns);
        GraphEquationSystem { graph, fin }
    }

    /// The finite system view.
    pub fn finite(&self) -> &FiniteEquationSystem<U, V> {
        &self.fin
    }

    /// The underlying graph body.
    pub fn graph(&self) -> &GraphBody<U, V, E> {
        &self.graph
    }

    /// This system with `combos` installed the standard way. See
    /// [`FiniteEquationSystem::with_combos`].
    pub fn with_combos(&self, combos: BoxComboAssignment<U, V>) -> Self {
        GraphEquationSystem {
            graph: self.graph.clone(),
            fin: self.fin.with_combos(combos),
        }
    }

    /// This system with `combos` applied inside the edge action, on
    /// loop-closing edges only.
    ///
    /// An edge `e` with target `x` is rewritten when `combos` is defined
    /// at `x` and `x` is at or before some source of `e` in `ordering`,
    /// i.e. when the edge closes a loop around `x`: its contribution
    /// becomes `combos(x)(rho(x), edge_action(rho)(e))`.
    /// When the combos are not idempotent the rewritten edges also read
    /// `x` itself, so their sources gain `x` and the outgoing edges of `x`
    /// gain those ingoing edges; influences then loop back to `x`.
    pub fn with_localized_combos(
        &self,
        combos: BoxComboAssignment<U, V>,
        ordering: Rc<dyn UnknownOrdering<U>>,
    ) -> Self
    where
        E: Clone,
    {
        let idempotent = combos.combos_are_idempotent();
        let combos = Rc::new(RefCell::new(combos));
        let g = self.graph.clone();

        let localizes = {
            let combos = Rc::clone(&combos);
            let sources = Rc::clone(&g.sources);
            let target = Rc::clone(&g.target);
            let ordering = Rc::clone(&ordering);
            move |e: &E| -> bool {
                let x = target(e);
                combos.borrow().is_defined_at(&x)
                    && sources(e).iter().any(|s| ordering.lteq(&x, s))
            }
        };
        let localizes = Rc::new(localizes);

        let edge_action: Rc<dyn Fn(&dyn Assignment<U, V>, &E) -> V> = {
            let combos = Rc::clone(&combos);
            let inner = Rc::clone(&g.edge_action);
            let target = Rc::clone(&g.target);
            let localizes = Rc::clone(&localizes);
            Rc::new(move |rho, e| {
                let contrib = inner(rho, e);
                if localizes(e) {
                    let x = target(e);
                    let old = rho.get(&x);
                    combos.borrow_mut().apply(&x, &old, &contrib)
                } else {
                    contrib
                }
            })
        };

        let (sources, outgoing) = if idempotent {
            (Rc::clone(&g.sources), Rc::clone(&g.outgoing))
        } else {
            let sources: Rc<dyn Fn(&E) -> Vec<U>> = {
                let inner = Rc::clone(&g.sources);
                let target = Rc::clone(&g.target);
                let localizes = Rc::clone(&localizes);
                Rc::new(move |e| {
                    let mut srcs = inner(e);
                    if localizes(e) {
                        let x = target(e);
                        if !srcs.contains(&x) {
                            srcs.push(x);
                        }
                    }
                    srcs
                })
            };
            let outgoing: Rc<dyn Fn(&U) -> Vec<E>> = {
                let inner = Rc::clone(&g.outgoing);
                let ingoing = Rc::clone(&g.ingoing);
                let localizes = Rc::clone(&localizes);
                Rc::new(move |u| {
                    let mut edges = inner(u);
                    for e in ingoing(u) {
                        if localizes(&e) {
                            edges.push(e);
                        }
                    }
                    edges
                })
            };
            (sources, outgoing)
        };

        let graph = GraphBody {
            edge_action,
            sources,
            target: Rc::clone(&g.target),
            outgoing,
            ingoing: Rc::clone(&g.ingoing),
            combiner: Rc::clone(&g.combiner),
        };

        let body = graph.body();
        let infl = graph.infl(self.fin.unknowns());
        let fin = FiniteEquationSystem::from_parts(
            self.fin.as_general().with_initial_body(body),
            infl,
            self.fin.unknowns().to_vec(),
            self.fin.input_unknowns().clone(),
        );
        GraphEquationSystem { graph, fin }
    }

    /// A finite system whose body fuses localized widening and narrowing.
    ///
    /// For each unknown `u` the edge contributions are collected; an edge
    /// is *wide* when it closes a loop around `u` (`u` is at or before
    /// some source in `ordering`) and its contribution is not below
    /// `rho(u)`. The pairs are reduced with
    /// the domain's upper bound and a flag-or. A wide result is widened,
    /// a strictly shrinking result is narrowed, anything else is returned
    /// as is.
    pub fn with_localized_warrowing(
        &self,
        widenings: BoxComboAssignment<U, V>,
        narrowings: BoxComboAssignment<U, V>,
        ordering: Rc<dyn UnknownOrdering<U>>,
    ) -> FiniteEquationSystem<U, V>
    where
        V: PreOrdered + UpperBound,
    {
        let g = self.graph.clone();
        let widenings = RefCell::new(widenings);
        let narrowings = RefCell::new(narrowings);

        let body: Body<U, V> = Rc::new(move |rho, u| {
            let edges = (g.ingoing)(u);
            if edges.is_empty() {
                return rho.get(u);
            }
            let current = rho.get(u);
            let mut acc: Option<(V, bool)> = None;
            for e in edges {
                let contrib = (g.edge_action)(rho, &e);
                let wide = (g.sources)(&e).iter().any(|s| ordering.lteq(u, s))
                    && !contrib.lteq(&current);
                acc = Some(match acc {
                    Some((prev, prev_wide)) => (prev.upper_bound(&contrib), prev_wide || wide),
                    None => (contrib, wide),
                });
            }
            match acc {
                Some((combined, true)) => widenings.borrow_mut().apply(u, &current, &combined),
                Some((combined, false)) => {
                    if combined.lt(&current) {
                        narrowings.borrow_mut().apply(u, &current, &combined)
                    } else {
                        combined
                    }
                }
                None => current,
            }
        });

        // the fused combo reads rho(u), hence the diagonal
        let infl = self.graph.infl(self.fin.unknowns()).with_diagonal();
        FiniteEquationSystem::from_parts(
            self.fin.as_general().with_initial_body(body),
            infl,
            self.fin.unknowns().to_vec(),
            self.fin.input_unknowns().clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assignment;
    use crate::core::combo;
    use crate::core::combo_assignment;
    use crate::ordering::dfo::DFOrdering;

    /// Edges as (source, target) pairs over i32 unknowns, values i64.
    fn pair_graph(edges: Vec<(i32, i32)>) -> GraphBody<i32, i64, (i32, i32)> {
        let edges = Rc::new(edges);
        let outgoing_edges = Rc::clone(&edges);
        let ingoing_edges = Rc::clone(&edges);
        GraphBody {
            // each edge contributes its source value plus one
            edge_action: Rc::new(|rho, e: &(i32, i32)| rho.get(&e.0) + 1),
            sources: Rc::new(|e: &(i32, i32)| vec![e.0]),
            target: Rc::new(|e: &(i32, i32)| e.1),
            outgoing: Rc::new(move |u| {
                outgoing_edges.iter().filter(|e| e.0 == *u).copied().collect()
            }),
            ingoing: Rc::new(move |u| {
                ingoing_edges.iter().filter(|e| e.1 == *u).copied().collect()
            }),
            combiner: Rc::new(|a: &i64, b: &i64| *a.max(b)),
        }
    }

    #[test]
    fn body_reduces_ingoing_edges() {
        let g = pair_graph(vec![(0, 2), (1, 2)]);
        let body = g.body();
        let rho = assignment::updated(assignment::constant::<i32, i64>(0), 1, 10);
        assert_eq!(body(&*rho, &2), 11);
        // no ingoing edges: the body is the identity
        assert_eq!(body(&*rho, &0), 0);
    }

    #[test]
    fn dependencies_and_influences_come_from_the_edges() {
        let g = pair_graph(vec![(0, 2), (1, 2), (2, 0)]);
        let (_, deps) = g.body_with_dependencies()(
            &*assignment::constant::<i32, i64>(0),
            &2,
        );
        assert_eq!(deps, vec![0, 1]);

        let infl = g.infl(&[0, 1, 2]);
        let image: Vec<i32> = infl.image(&2).copied().collect();
        assert_eq!(image, vec![0]);
    }

    #[test]
    fn localized_combos_rewrite_only_loop_edges() {
        // 0 -> 1 -> 2 -> 1: the edge 2 -> 1 closes the loop
        let sys = GraphEquationSystem::new(
            pair_graph(vec![(0, 1), (1, 2), (2, 1)]),
            vec![0, 1, 2],
            [0],
        );
        let dfo: Rc<dyn UnknownOrdering<i32>> = Rc::new(DFOrdering::of(sys.finite()));
        let localized = sys.with_localized_combos(
            combo_assignment::constant(combo::from_fn(|_x: &i64, _y: &i64| 999, true)),
            dfo,
        );
        let body = localized.finite().body();
        let rho = assignment::constant::<i32, i64>(5);
        // body(1) = max(edge 0->1, widened edge 2->1) = max(6, 999)
        assert_eq!(body(&*rho, &1), 999);
        // body(2) has no loop-closing ingoing edge
        assert_eq!(body(&*rho, &2), 6);
    }

    #[test]
    fn non_idempotent_localized_combos_loop_influence_back() {
        let sys = GraphEquationSystem::new(
            pair_graph(vec![(0, 1), (1, 2), (2, 1)]),
            vec![0, 1, 2],
            [0],
        );
        let dfo: Rc<dyn UnknownOrdering<i32>> = Rc::new(DFOrdering::of(sys.finite()));
        let localized = sys.with_localized_combos(
            combo_assignment::constant(combo::from_fn(|x: &i64, y: &i64| x + y, false)),
            dfo,
        );
        let infl = localized.finite().infl();
        let image: Vec<i32> = infl.image(&1).copied().collect();
        // 1 still influences 2, and now also itself through the rewritten
        // loop-closing edge
        assert!(image.contains(&2));
        assert!(image.contains(&1));
    }

    #[test]
    fn localized_warrowing_widens_growing_loop_edges() {
        let sys = GraphEquationSystem::new(
            pair_graph(vec![(0, 1), (1, 2), (2, 1)]),
            vec![0, 1, 2],
            [0],
        );
        let dfo: Rc<dyn UnknownOrdering<i32>> = Rc::new(DFOrdering::of(sys.finite()));
        let fin = sys.with_localized_warrowing(
            combo_assignment::constant(combo::from_fn(|_x: &i64, _y: &i64| i64::MAX, false)),
            combo_assignment::constant(combo::from_fn(|_x: &i64, y: &i64| *y, false)),
            dfo,
        );
        let body = fin.body();
        // growing contribution through the loop edge: widened
        let rho = assignment::constant::<i32, i64>(5);
        assert_eq!(body(&*rho, &1), i64::MAX);
        // shrinking result: narrowed (here, the narrowing keeps the new value)
        let rho2 = assignment::updated(assignment::constant::<i32, i64>(0), 1, 50);
        assert_eq!(body(&*rho2, &1), 1);
    }
}
