//! Hierarchical-ordering solver
//!
//! Walks the parenthesized sequence of a [`HierarchicalOrdering`] left to
//! right. Each parenthesized component is iterated until a full pass over
//! it changes nothing, before the walk moves past its closing parenthesis;
//! nesting gives the classic recursive iteration strategy of weak
//! topological orderings, driven here by an explicit frame stack.

use std::rc::Rc;

use crate::core::assignment::{Assignment, MapAssignment, MutableAssignment};
use crate::eqs::finite::FiniteEquationSystem;
use crate::ordering::hierarchical::{HOElement, HierarchicalOrdering};
use crate::solvers::tracer::FixpointSolverTracer;

/// Solve `eqs` starting from `start` by walking `ordering`.
pub fn solve<U, V>(
    eqs: &FiniteEquationSystem<U, V>,
    start: &Rc<dyn Assignment<U, V>>,
    ordering: &HierarchicalOrdering<U>,
    tracer: &dyn FixpointSolverTracer<U, V>,
) -> MapAssignment<U, V>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + PartialEq + 'static,
{
    let body = eqs.body();
    let mut current = eqs.mutable_assignment(Rc::clone(start));
    tracer.initialized(&current);

    let elements = ordering.elements();
    // frames: (index just after the matching Left, dirty flag saved there)
    let mut stack: Vec<(usize, bool)> = Vec::new();
    let mut dirty = false;
    let mut i = 0;

    while i < elements.len() {
        match &elements[i] {
            HOElement::Left => {
                stack.push((i + 1, dirty));
                dirty = false;
                i += 1;
            }
            HOElement::Val(u) => {
                let newval = body(&current, u);
                tracer.evaluated(&current, u, &newval);
                if newval != current.get(u) {
                    current.update(u.clone(), newval);
                    dirty = true;
                }
                i += 1;
            }
            HOElement::Right => match stack.last().copied() {
                Some((component_start, saved_dirty)) => {
                    if dirty {
                        // the component changed something: iterate it again
                        dirty = false;
                        i = component_start;
                    } else {
                        stack.pop();
                        dirty = saved_dirty;
                        i += 1;
                    }
                }
                // unmatched Right cannot occur in a validated ordering
                None => {
                    i += 1;
                }
            },
        }
    }

    tracer.completed(&current);
    current
}
