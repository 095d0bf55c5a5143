//! General (possibly infinite) equation systems
//!
//! An [`EquationSystem`] packages an initial body with up to three optional
//! layers: a combo assignment, a base assignment with its merge operation,
//! and a tracer. The layers stay unresolved until [`EquationSystem::body`]
//! is called, which composes them in the canonical order base -> combos ->
//! tracer and returns a single boxed closure.
//!
//! Systems are value-like: the `with_*` transformers clone the system and
//! replace one optional field on the clone, leaving the original usable.

use std::rc::Rc;

use crate::core::assignment::{Assignment, MapAssignment};
use crate::core::combo_assignment::{BoxComboAssignment, ComboAssignment};
use crate::core::domain::Magma;
use crate::eqs::body::{
    add_base_assignment, add_combos, add_tracer, with_dependencies, BaseAssignment, Body,
    BodyWithDeps, CombineOp,
};
use crate::eqs::tracer::EquationSystemTracer;

/// An equation system over unknowns `U` and values `V`, with no finiteness
/// assumption. Infinite systems are solved locally by the infinite
/// worklist solvers, which discover the reachable unknowns on the fly.
pub struct EquationSystem<U, V> {
    initial_body: Body<U, V>,
    combos: Option<BoxComboAssignment<U, V>>,
    base: Option<(BaseAssignment<U, V>, CombineOp<V>)>,
    tracer: Option<Rc<dyn EquationSystemTracer<U, V>>>,
}

impl<U, V> Clone for EquationSystem<U, V> {
    fn clone(&self) -> Self {
        EquationSystem {
            initial_body: Rc::clone(&self.initial_body),
            combos: self.combos.as_ref().map(|c| c.clone_box()),
            base: self
                .base
                .as_ref()
                .map(|(init, op)| (Rc::clone(init), Rc::clone(op))),
            tracer: self.tracer.as_ref().map(Rc::clone),
        }
    }
}

impl<U, V> EquationSystem<U, V>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + 'static,
{
    /// A system with the given body and no optional layers.
    pub fn new(body: Body<U, V>) -> Self {
        EquationSystem {
            initial_body: body,
            combos: None,
            base: None,
            tracer: None,
        }
    }

    /// A system whose body is the closure `f`.
    pub fn from_fn(f: impl Fn(&dyn Assignment<U, V>, &U) -> V + 'static) -> Self {
        Self::new(Rc::new(f))
    }

    /// The composed body: base assignment, then combos, then tracer.
    ///
    /// Each call resolves the layers afresh, so every returned body owns
    /// pristine per-unknown combo state.
    pub fn body(&self) -> Body<U, V> {
        let mut body = Rc::clone(&self.initial_body);
        if let Some((init, op)) = &self.base {
            body = add_base_assignment(body, Rc::clone(init), Rc::clone(op));
        }
        if let Some(combos) = &self.combos {
            body = add_combos(body, combos.as_ref(), self.tracer.clone());
        }
        if let Some(tracer) = &self.tracer {
            body = add_tracer(body, Rc::clone(tracer));
        }
        body
    }

    /// The composed body, also reporting the unknowns each evaluation read.
    pub fn body_with_dependencies(&self) -> BodyWithDeps<U, V> {
        with_dependencies(self.body())
    }

    /// An empty mutable assignment falling back to `rho`.
    pub fn mutable_assignment(&self, rho: Rc<dyn Assignment<U, V>>) -> MapAssignment<U, V> {
        MapAssignment::updating(rho)
    }

    /// This system with `combos` installed, replacing any previous combo
    /// assignment. The system owns the assignment from here on.
    pub fn with_combos(&self, combos: BoxComboAssignment<U, V>) -> Self {
        let mut sys = self.clone();
        sys.combos = Some(combos);
        sys
    }

    /// This system with a base assignment merged in through `op`.
    pub fn with_base_assignment(
        &self,
        init: impl Fn(&U) -> Option<V> + 'static,
        op: impl Fn(&V, &V) -> V + 'static,
    ) -> Self {
        let mut sys = self.clone();
        sys.base = Some((Rc::new(init), Rc::new(op)));
        sys
    }

    /// This system with a base assignment merged in through the domain's
    /// magma combine.
    pub fn with_magma_base_assignment(&self, init: impl Fn(&U) -> Option<V> + 'static) -> Self
    where
        V: Magma,
    {
        self.with_base_assignment(init, |a: &V, b: &V| a.magma_combine(b))
    }

    /// This system observed by `tracer`.
    pub fn with_tracer(&self, tracer: Rc<dyn EquationSystemTracer<U, V>>) -> Self {
        let mut sys = self.clone();
        sys.tracer = Some(tracer);
        sys
    }

    /// The installed combo assignment, if any.
    pub(crate) fn combos(&self) -> Option<&dyn ComboAssignment<U, V>> {
        self.combos.as_deref()
    }

    /// This system with its initial body swapped out, all layers kept.
    pub(crate) fn with_initial_body(&self, body: Body<U, V>) -> Self {
        let mut sys = self.clone();
        sys.initial_body = body;
        sys
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assignment;
    use crate::core::combo;
    use crate::core::combo_assignment;

    #[test]
    fn with_combos_is_functional() {
        let sys = EquationSystem::from_fn(|rho: &dyn Assignment<i32, i64>, u| rho.get(u) + 1);
        let with = sys.with_combos(combo_assignment::constant(combo::from_fn(
            |x, y| x + y,
            false,
        )));

        let rho = assignment::constant::<i32, i64>(10);
        // original untouched: plain body
        assert_eq!(sys.body()(&*rho, &0), 11);
        // combo sees (rho(u), body result)
        assert_eq!(with.body()(&*rho, &0), 21);
    }

    #[test]
    fn last_installed_combos_win() {
        let sys = EquationSystem::from_fn(|rho: &dyn Assignment<i32, i64>, u| rho.get(u) + 1);
        let twice = sys
            .with_combos(combo_assignment::constant(combo::left()))
            .with_combos(combo_assignment::constant(combo::right()));
        let rho = assignment::constant::<i32, i64>(10);
        assert_eq!(twice.body()(&*rho, &0), 11);
    }

    #[test]
    fn base_is_applied_before_combos() {
        let sys = EquationSystem::from_fn(|rho: &dyn Assignment<i32, i64>, u| rho.get(u) + 1)
            .with_base_assignment(
                |u: &i32| (*u == 0).then_some(100_i64),
                |a: &i64, b: &i64| a + b,
            )
            .with_combos(combo_assignment::constant(combo::from_fn(
                |_x, y| y * 2,
                false,
            )));
        let rho = assignment::constant::<i32, i64>(10);
        // base first: 100 + 11 = 111, then combo doubles
        assert_eq!(sys.body()(&*rho, &0), 222);
    }

    #[test]
    fn each_body_owns_fresh_combo_state() {
        let sys = EquationSystem::from_fn(|rho: &dyn Assignment<i32, i64>, u| rho.get(u) + 1)
            .with_combos(combo_assignment::templated(combo::cascade(
                combo::right(),
                1,
                combo::from_fn(|x, y| x + y, false),
            )));
        let rho = assignment::constant::<i32, i64>(10);

        let body1 = sys.body();
        assert_eq!(body1(&*rho, &0), 11);
        assert_eq!(body1(&*rho, &0), 21);

        // a second body starts with its own pristine cascade counters
        let body2 = sys.body();
        assert_eq!(body2(&*rho, &0), 11);
    }
}
