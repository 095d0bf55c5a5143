//! Bodies: right-hand sides as assignment transformers
//!
//! A [`Body`] computes, from the current assignment, the right-hand side of
//! the equation of any unknown. Bodies are plain boxed closures and compose
//! through three orthogonal transformations:
//!
//! 1. [`add_base_assignment`] merges a partial base value into the result,
//! 2. [`add_combos`] pipes the result through the combo installed at the
//!    unknown,
//! 3. [`add_tracer`] surrounds the evaluation with observer callbacks.
//!
//! When an equation system requests all three, they are applied in exactly
//! that order: combos observe base-merged values and the tracer observes
//! the final value.
//!
//! [`with_dependencies`] turns a body into a [`BodyWithDeps`] that also
//! reports which unknowns the evaluation read, by instrumenting the
//! assignment handed to the inner body.

use std::cell::RefCell;
use std::rc::Rc;

use crate::core::assignment::Assignment;
use crate::core::combo_assignment::ComboAssignment;
use crate::eqs::tracer::EquationSystemTracer;

/// A body: given the current assignment, the value of each unknown's
/// right-hand side.
pub type Body<U, V> = Rc<dyn Fn(&dyn Assignment<U, V>, &U) -> V>;

/// A body that also reports the unknowns queried during evaluation.
pub type BodyWithDeps<U, V> = Rc<dyn Fn(&dyn Assignment<U, V>, &U) -> (V, Vec<U>)>;

/// A partial assignment of base values, used by [`add_base_assignment`].
pub type BaseAssignment<U, V> = Rc<dyn Fn(&U) -> Option<V>>;

/// A plain binary operation on values.
pub type CombineOp<V> = Rc<dyn Fn(&V, &V) -> V>;

/// Merge `init` into `body`: at unknowns where `init` is defined the result
/// is `op(init(u), body(rho)(u))`, elsewhere the body alone.
pub fn add_base_assignment<U: 'static, V: 'static>(
    body: Body<U, V>,
    init: BaseAssignment<U, V>,
    op: CombineOp<V>,
) -> Body<U, V> {
    Rc::new(move |rho, u| {
        let res = body(rho, u);
        match init(u) {
            Some(base) => op(&base, &res),
            None => res,
        }
    })
}

/// Pipe `body` through `combos`: at unknowns where a combo is installed the
/// result is `combos(u)(rho(u), body(rho)(u))`, elsewhere the body alone.
///
/// The combo assignment is cloned first, so per-unknown combo state (e.g.
/// cascade counters) belongs to the returned body and never leaks back to
/// the caller's copy.
pub fn add_combos<U, V>(
    body: Body<U, V>,
    combos: &dyn ComboAssignment<U, V>,
    tracer: Option<Rc<dyn EquationSystemTracer<U, V>>>,
) -> Body<U, V>
where
    U: 'static,
    V: 'static,
{
    let combos = RefCell::new(combos.clone_box());
    Rc::new(move |rho, u| {
        let res = body(rho, u);
        let mut combos = combos.borrow_mut();
        if combos.is_defined_at(u) {
            let comboed = combos.apply(u, &rho.get(u), &res);
            if let Some(t) = &tracer {
                t.combo_evaluation(rho, u, &res, &comboed);
            }
            comboed
        } else {
            res
        }
    })
}

/// Surround every evaluation of `body` with the tracer's callbacks.
pub fn add_tracer<U: 'static, V: 'static>(
    body: Body<U, V>,
    tracer: Rc<dyn EquationSystemTracer<U, V>>,
) -> Body<U, V> {
    Rc::new(move |rho, u| {
        tracer.before_evaluation(rho, u);
        let res = body(rho, u);
        tracer.after_evaluation(rho, u, &res);
        res
    })
}

/// Assignment wrapper recording every queried unknown.
struct TrackingAssignment<'a, U, V> {
    inner: &'a dyn Assignment<U, V>,
    seen: RefCell<Vec<U>>,
}

impl<U: Clone, V> Assignment<U, V> for TrackingAssignment<'_, U, V> {
    fn get(&self, u: &U) -> V {
        self.seen.borrow_mut().push(u.clone());
        self.inner.get(u)
    }
}

/// The default dependency-reporting version of `body`.
///
/// Evaluation at `u` runs the body against an instrumented assignment and
/// reports the queried unknowns in query order, with repetitions.
pub fn with_dependencies<U: Clone + 'static, V: 'static>(body: Body<U, V>) -> BodyWithDeps<U, V> {
    Rc::new(move |rho, u| {
        let tracking = TrackingAssignment {
            inner: rho,
            seen: RefCell::new(Vec::new()),
        };
        let res = body(&tracking, u);
        (res, tracking.seen.into_inner())
    })
}
