//! Finite equation systems
//!
//! A [`FiniteEquationSystem`] knows its unknowns up front and carries an
//! influence relation satisfying the locality contract: whenever two
//! assignments agree on the inverse influence image of `u`, the body of `u`
//! evaluates to the same value in both. Worklist-style solvers rely on
//! that contract when scheduling re-evaluations.
//!
//! Installing a combo assignment that is not entirely idempotent makes
//! every unknown influence itself (the combo reads `rho(u)`), so the
//! effective influence relation is augmented with the diagonal in that
//! case.

use std::rc::Rc;

use rustc_hash::FxHashSet;

use crate::core::assignment::{Assignment, MapAssignment};
use crate::core::combo_assignment::BoxComboAssignment;
use crate::core::domain::Magma;
use crate::eqs::body::{Body, BodyWithDeps};
use crate::eqs::relation::Relation;
use crate::eqs::system::EquationSystem;
use crate::eqs::tracer::EquationSystemTracer;

/// An equation system over a known finite set of unknowns.
pub struct FiniteEquationSystem<U, V> {
    sys: EquationSystem<U, V>,
    unknowns: Vec<U>,
    input_unknowns: FxHashSet<U>,
    infl: Relation<U>,
}

impl<U: Clone, V> Clone for FiniteEquationSystem<U, V> {
    fn clone(&self) -> Self {
        FiniteEquationSystem {
            sys: self.sys.clone(),
            unknowns: self.unknowns.clone(),
            input_unknowns: self.input_unknowns.clone(),
            infl: self.infl.clone(),
        }
    }
}

impl<U, V> FiniteEquationSystem<U, V>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + 'static,
{
    /// A finite system with the given body, influence relation, unknowns
    /// and input unknowns.
    pub fn new(
        body: Body<U, V>,
        infl: Relation<U>,
        unknowns: Vec<U>,
        input_unknowns: impl IntoIterator<Item = U>,
    ) -> Self {
        FiniteEquationSystem {
            sys: EquationSystem::new(body),
            unknowns,
            input_unknowns: input_unknowns.into_iter().collect(),
            infl,
        }
    }

    /// The unknowns of the system, in their declaration order.
    pub fn unknowns(&self) -> &[U] {
        &self.unknowns
    }

    /// The unknowns a depth-first exploration starts from.
    pub fn input_unknowns(&self) -> &FxHashSet<U> {
        &self.input_unknowns
    }

    /// The effective influence relation: the declared one, augmented with
    /// the diagonal when a non-idempotent combo assignment is installed.
    pub fn infl(&self) -> Relation<U> {
        let needs_diagonal = self
            .sys
            .combos()
            .is_some_and(|c| !c.combos_are_idempotent());
        if needs_diagonal {
            self.infl.clone().with_diagonal()
        } else {
            self.infl.clone()
        }
    }

    /// The composed body. See [`EquationSystem::body`].
    pub fn body(&self) -> Body<U, V> {
        self.sys.body()
    }

    /// The composed body with dependency reporting.
    pub fn body_with_dependencies(&self) -> BodyWithDeps<U, V> {
        self.sys.body_with_dependencies()
    }

    /// An empty mutable assignment falling back to `rho`.
    pub fn mutable_assignment(&self, rho: Rc<dyn Assignment<U, V>>) -> MapAssignment<U, V> {
        self.sys.mutable_assignment(rho)
    }

    /// This system with `combos` installed.
    pub fn with_combos(&self, combos: BoxComboAssignment<U, V>) -> Self {
        let mut fin = self.clone();
        fin.sys = self.sys.with_combos(combos);
        fin
    }

    /// This system with a base assignment merged in through `op`.
    pub fn with_base_assignment(
        &self,
        init: impl Fn(&U) -> Option<V> + 'static,
        op: impl Fn(&V, &V) -> V + 'static,
    ) -> Self {
        let mut fin = self.clone();
        fin.sys = self.sys.with_base_assignment(init, op);
        fin
    }

    /// This system with a base assignment merged in through the domain's
    /// magma combine.
    pub fn with_magma_base_assignment(&self, init: impl Fn(&U) -> Option<V> + 'static) -> Self
    where
        V: Magma,
    {
        let mut fin = self.clone();
        fin.sys = self.sys.with_magma_base_assignment(init);
        fin
    }

    /// This system observed by `tracer`.
    pub fn with_tracer(&self, tracer: Rc<dyn EquationSystemTracer<U, V>>) -> Self {
        let mut fin = self.clone();
        fin.sys = self.sys.with_tracer(tracer);
        fin
    }

    /// The underlying general system.
    pub fn as_general(&self) -> &EquationSystem<U, V> {
        &self.sys
    }

    /// Build a finite system around an already-assembled general system.
    pub(crate) fn from_parts(
        sys: EquationSystem<U, V>,
        infl: Relation<U>,
        unknowns: Vec<U>,
        input_unknowns: FxHashSet<U>,
    ) -> Self {
        FiniteEquationSystem {
            sys,
            unknowns,
            input_unknowns,
            infl,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::assignment;
    use crate::core::combo;
    use crate::core::combo_assignment;

    fn chain_system() -> FiniteEquationSystem<i32, i64> {
        // body(rho)(0) = rho(0), body(rho)(i) = rho(i - 1)
        let body: Body<i32, i64> = Rc::new(|rho, u| {
            if *u == 0 {
                rho.get(&0)
            } else {
                rho.get(&(u - 1))
            }
        });
        FiniteEquationSystem::new(
            body,
            Relation::from_pairs([(0, 1), (1, 2)]),
            vec![0, 1, 2],
            [0],
        )
    }

    #[test]
    fn idempotent_combos_keep_infl() {
        let eqs = chain_system().with_combos(combo_assignment::constant(combo::upper_bound()));
        let image: Vec<i32> = eqs.infl().image(&0).copied().collect();
        assert_eq!(image, vec![1]);
    }

    #[test]
    fn non_idempotent_combos_add_the_diagonal() {
        let eqs = chain_system().with_combos(combo_assignment::constant(combo::from_fn(
            |x: &i64, y: &i64| x + y,
            false,
        )));
        let image: Vec<i32> = eqs.infl().image(&0).copied().collect();
        assert_eq!(image, vec![1, 0]);
    }

    #[test]
    fn locality_over_the_inverse_influence_image() {
        let eqs = chain_system();
        let body = eqs.body();
        // body(2) reads only rho(1) = infl^-1(2)
        let rho1 = assignment::updated(assignment::constant::<i32, i64>(0), 1, 7);
        let rho2 = assignment::updated(
            assignment::updated(assignment::constant::<i32, i64>(9), 1, 7),
            0,
            5,
        );
        assert_eq!(body(&*rho1, &2), body(&*rho2, &2));
    }
}
