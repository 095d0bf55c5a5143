//! Two-phase / warrowing convenience driver
//!
//! Solving a static-analysis system usually means more than one call: pick
//! an ordering, decide where widenings go, run an ascending phase, swap
//! widenings for narrowings, run again. This module packages those
//! choices behind a single [`solve`] entry driven by [`Params`]:
//!
//! - *location* - install combos nowhere, everywhere, or at loop heads,
//! - *scope* - apply them the standard way or localized inside the edge
//!   action (graph systems only),
//! - *strategy* - a single widening pass, the classic two-phase
//!   widening-then-narrowing scheme, or a fused warrowing pass,
//! - *restart* - optionally throw away downstream values when an update
//!   decreases.
//!
//! The driver picks the ordering the chosen solver needs: the hierarchical
//! solver gets a hierarchical ordering refined from the depth-first one,
//! everything else gets the depth-first ordering of the influence graph.

use std::rc::Rc;

use crate::core::assignment::{Assignment, MapAssignment};
use crate::core::combo_assignment::{self, BoxComboAssignment};
use crate::core::domain::{PreOrdered, UpperBound};
use crate::eqs::finite::FiniteEquationSystem;
use crate::eqs::graph::GraphEquationSystem;
use crate::error::FixError;
use crate::ordering::dfo::DFOrdering;
use crate::ordering::hierarchical::HierarchicalOrdering;
use crate::ordering::UnknownOrdering;
use crate::solvers::tracer::{FixpointSolverTracer, NoopSolverTracer};
use crate::solvers::{hierarchical, kleene, priority_worklist, round_robin, worklist};

/// Which fixpoint solver the driver runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolverKind {
    /// Sweep all unknowns until stable.
    RoundRobin,
    /// Sweeps with updates deferred to the next sweep.
    Kleene,
    /// FIFO worklist along the influence relation.
    WorkList,
    /// Worklist popping in depth-first order, with restart support.
    PriorityWorkList,
    /// Component-wise iteration of a hierarchical ordering.
    HierarchicalOrdering,
}

/// Where combos are installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComboLocation {
    /// Nowhere: solve the bare system.
    None,
    /// At every unknown.
    All,
    /// At loop heads only.
    Loop,
}

/// How combos are applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComboScope {
    /// Through the combo assignment layered on the body.
    Standard,
    /// Inside the edge action, on loop-closing edges (graph systems only).
    Localized,
}

/// Which iteration scheme combines widenings and narrowings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComboStrategy {
    /// A single pass with widenings only.
    OnlyWidening,
    /// An ascending pass with widenings, then a descending pass with
    /// narrowings applied the standard way.
    TwoPhases,
    /// A single pass with widenings and narrowings fused into warrowings.
    Warrowing,
}

/// Whether decreasing updates restart downstream unknowns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestartStrategy {
    /// Never restart.
    None,
    /// Reset unknowns ordered after `u` when the value of `u` decreases.
    Restart,
}

/// Everything a driver run needs besides the equation system.
pub struct Params<U, V> {
    /// The solver to run.
    pub solver: SolverKind,
    /// The initial assignment.
    pub start: Rc<dyn Assignment<U, V>>,
    /// Where combos are installed.
    pub combo_location: ComboLocation,
    /// How combos are applied.
    pub combo_scope: ComboScope,
    /// How widenings and narrowings are combined.
    pub combo_strategy: ComboStrategy,
    /// Whether decreasing updates restart downstream unknowns.
    pub restart_strategy: RestartStrategy,
    /// The widening assignment.
    pub widenings: BoxComboAssignment<U, V>,
    /// The narrowing assignment.
    pub narrowings: BoxComboAssignment<U, V>,
    /// An optional observer of the solve.
    pub tracer: Option<Rc<dyn FixpointSolverTracer<U, V>>>,
}

impl<U: 'static, V: Clone + 'static> Params<U, V> {
    /// The classic two-phase scheme: widen at loop heads on the way up,
    /// narrow at loop heads on the way down.
    pub fn cc77(
        solver: SolverKind,
        start: Rc<dyn Assignment<U, V>>,
        widenings: BoxComboAssignment<U, V>,
        narrowings: BoxComboAssignment<U, V>,
    ) -> Self {
        Params {
            solver,
            start,
            combo_location: ComboLocation::Loop,
            combo_scope: ComboScope::Standard,
            combo_strategy: ComboStrategy::TwoPhases,
            restart_strategy: RestartStrategy::None,
            widenings,
            narrowings,
            tracer: None,
        }
    }

    /// A single ascending pass widening at loop heads, no narrowing.
    pub fn only_widening(
        solver: SolverKind,
        start: Rc<dyn Assignment<U, V>>,
        widenings: BoxComboAssignment<U, V>,
    ) -> Self {
        Params {
            solver,
            start,
            combo_location: ComboLocation::Loop,
            combo_scope: ComboScope::Standard,
            combo_strategy: ComboStrategy::OnlyWidening,
            restart_strategy: RestartStrategy::None,
            widenings,
            narrowings: combo_assignment::empty(),
            tracer: None,
        }
    }

    /// This parameter set observed by `tracer`.
    pub fn with_tracer(mut self, tracer: Rc<dyn FixpointSolverTracer<U, V>>) -> Self {
        self.tracer = Some(tracer);
        self
    }
}

/// The systems the driver can run on: finite systems directly, graph
/// systems additionally supporting localized scope.
pub trait DriverSystem<U, V> {
    /// The finite-system view.
    fn finite(&self) -> &FiniteEquationSystem<U, V>;

    /// This system with `combos` localized inside the edge action.
    fn localized_combos(
        &self,
        combos: BoxComboAssignment<U, V>,
        ordering: Rc<dyn UnknownOrdering<U>>,
    ) -> Result<FiniteEquationSystem<U, V>, FixError>;

    /// This system with localized warrowing fused into the body.
    fn localized_warrowing(
        &self,
        widenings: BoxComboAssignment<U, V>,
        narrowings: BoxComboAssignment<U, V>,
        ordering: Rc<dyn UnknownOrdering<U>>,
    ) -> Result<FiniteEquationSystem<U, V>, FixError>;
}

impl<U, V> DriverSystem<U, V> for FiniteEquationSystem<U, V>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + 'static,
{
    fn finite(&self) -> &FiniteEquationSystem<U, V> {
        self
    }

    fn localized_combos(
        &self,
        _combos: BoxComboAssignment<U, V>,
        _ordering: Rc<dyn UnknownOrdering<U>>,
    ) -> Result<FiniteEquationSystem<U, V>, FixError> {
        Err(FixError::LocalizationRequiresGraph)
    }

    fn localized_warrowing(
        &self,
        _widenings: BoxComboAssignment<U, V>,
        _narrowings: BoxComboAssignment<U, V>,
        _ordering: Rc<dyn UnknownOrdering<U>>,
    ) -> Result<FiniteEquationSystem<U, V>, FixError> {
        Err(FixError::LocalizationRequiresGraph)
    }
}

impl<U, V, E> DriverSystem<U, V> for GraphEquationSystem<U, V, E>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + PreOrdered + UpperBound + 'static,
    E: Clone + 'static,
{
    fn finite(&self) -> &FiniteEquationSystem<U, V> {
        self.finite()
    }

    fn localized_combos(
        &self,
        combos: BoxComboAssignment<U, V>,
        ordering: Rc<dyn UnknownOrdering<U>>,
    ) -> Result<FiniteEquationSystem<U, V>, FixError> {
        Ok(self.with_localized_combos(combos, ordering).finite().clone())
    }

    fn localized_warrowing(
        &self,
        widenings: BoxComboAssignment<U, V>,
        narrowings: BoxComboAssignment<U, V>,
        ordering: Rc<dyn UnknownOrdering<U>>,
    ) -> Result<FiniteEquationSystem<U, V>, FixError> {
        Ok(self.with_localized_warrowing(widenings, narrowings, ordering))
    }
}

/// The ordering the driver built for this run.
enum OrderingChoice<U> {
    DepthFirst(Rc<DFOrdering<U>>),
    Hierarchical(Rc<HierarchicalOrdering<U>>),
}

impl<U: Clone + Eq + std::hash::Hash + 'static> OrderingChoice<U> {
    fn as_unknown_ordering(&self) -> Rc<dyn UnknownOrdering<U>> {
        match self {
            OrderingChoice::DepthFirst(d) => Rc::clone(d) as Rc<dyn UnknownOrdering<U>>,
            OrderingChoice::Hierarchical(h) => Rc::clone(h) as Rc<dyn UnknownOrdering<U>>,
        }
    }
}

/// Restrict `combos` to the unknowns the location selects.
fn filter_by_location<U, V>(
    combos: BoxComboAssignment<U, V>,
    location: ComboLocation,
    ordering: &Rc<dyn UnknownOrdering<U>>,
) -> BoxComboAssignment<U, V>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + 'static,
{
    match location {
        ComboLocation::None => combo_assignment::empty(),
        ComboLocation::All => combos,
        ComboLocation::Loop => {
            let ordering = Rc::clone(ordering);
            combo_assignment::restrict(combos, move |u| ordering.is_head(u))
        }
    }
}

/// Install `combos` on `eqs` according to the scope.
fn apply_by_scope<U, V, S>(
    eqs: &S,
    combos: BoxComboAssignment<U, V>,
    scope: ComboScope,
    ordering: &OrderingChoice<U>,
) -> Result<FiniteEquationSystem<U, V>, FixError>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + 'static,
    S: DriverSystem<U, V>,
{
    match scope {
        ComboScope::Standard => Ok(eqs.finite().with_combos(combos)),
        ComboScope::Localized => eqs.localized_combos(combos, ordering.as_unknown_ordering()),
    }
}

/// Run the solver the parameters selected.
fn run_solver<U, V>(
    kind: SolverKind,
    eqs: &FiniteEquationSystem<U, V>,
    start: &Rc<dyn Assignment<U, V>>,
    ordering: &OrderingChoice<U>,
    restart: &dyn Fn(&V, &V) -> bool,
    tracer: &dyn FixpointSolverTracer<U, V>,
) -> Result<MapAssignment<U, V>, FixError>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + PartialEq + 'static,
{
    match kind {
        SolverKind::RoundRobin => Ok(round_robin::solve(eqs, start, tracer)),
        SolverKind::Kleene => Ok(kleene::solve(eqs, start, tracer)),
        SolverKind::WorkList => Ok(worklist::solve(eqs, start, tracer)),
        SolverKind::PriorityWorkList => {
            let ordering = ordering.as_unknown_ordering();
            Ok(priority_worklist::solve(
                eqs,
                start,
                ordering.as_ref(),
                restart,
                tracer,
            ))
        }
        SolverKind::HierarchicalOrdering => match ordering {
            OrderingChoice::Hierarchical(ho) => {
                Ok(hierarchical::solve(eqs, start, ho.as_ref(), tracer))
            }
            OrderingChoice::DepthFirst(_) => Err(FixError::ordering_mismatch(
                "HierarchicalOrderingSolver",
                "a hierarchical ordering",
            )),
        },
    }
}

/// Solve `eqs` as configured by `params`.
///
/// # Errors
///
/// [`FixError::LocalizationRequiresGraph`] when localized scope is
/// requested on a system without graph structure, and
/// [`FixError::OrderingMismatch`] when the hierarchical solver ends up
/// paired with a non-hierarchical ordering.
pub fn solve<U, V, S>(eqs: &S, params: Params<U, V>) -> Result<MapAssignment<U, V>, FixError>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + PartialEq + PreOrdered + 'static,
    S: DriverSystem<U, V>,
{
    let tracer: Rc<dyn FixpointSolverTracer<U, V>> = params
        .tracer
        .unwrap_or_else(|| Rc::new(NoopSolverTracer));

    let dfo = Rc::new(DFOrdering::of(eqs.finite()));
    let ordering = if params.solver == SolverKind::HierarchicalOrdering {
        OrderingChoice::Hierarchical(Rc::new(HierarchicalOrdering::from_ordering(&*dfo)))
    } else {
        OrderingChoice::DepthFirst(dfo)
    };
    let dyn_ordering = ordering.as_unknown_ordering();

    let restart: Box<dyn Fn(&V, &V) -> bool> = match params.restart_strategy {
        RestartStrategy::Restart => Box::new(|newval: &V, oldval: &V| newval.lt(oldval)),
        RestartStrategy::None => Box::new(|_, _| false),
    };

    match params.combo_strategy {
        ComboStrategy::OnlyWidening => {
            let combos =
                filter_by_location(params.widenings, params.combo_location, &dyn_ordering);
            let sys = apply_by_scope(eqs, combos, params.combo_scope, &ordering)?;
            run_solver(
                params.solver,
                &sys,
                &params.start,
                &ordering,
                restart.as_ref(),
                tracer.as_ref(),
            )
        }
        ComboStrategy::TwoPhases => {
            let widenings =
                filter_by_location(params.widenings, params.combo_location, &dyn_ordering);
            let ascending = apply_by_scope(eqs, widenings, params.combo_scope, &ordering)?;
            tracer.ascending_begins(params.start.as_ref());
            let rho = run_solver(
                params.solver,
                &ascending,
                &params.start,
                &ordering,
                restart.as_ref(),
                tracer.as_ref(),
            )?;

            // narrowing is never localized
            let narrowings =
                filter_by_location(params.narrowings, params.combo_location, &dyn_ordering);
            let descending = eqs.finite().with_combos(narrowings);
            let rho: Rc<dyn Assignment<U, V>> = Rc::new(rho);
            tracer.descending_begins(rho.as_ref());
            run_solver(
                params.solver,
                &descending,
                &rho,
                &ordering,
                restart.as_ref(),
                tracer.as_ref(),
            )
        }
        ComboStrategy::Warrowing => {
            let sys = match params.combo_scope {
                ComboScope::Localized => {
                    let widenings =
                        filter_by_location(params.widenings, params.combo_location, &dyn_ordering);
                    let narrowings =
                        filter_by_location(params.narrowings, params.combo_location, &dyn_ordering);
                    eqs.localized_warrowing(widenings, narrowings, Rc::clone(&dyn_ordering))?
                }
                ComboScope::Standard => {
                    let fused = combo_assignment::warrowing(params.widenings, params.narrowings);
                    let combos =
                        filter_by_location(fused, params.combo_location, &dyn_ordering);
                    eqs.finite().with_combos(combos)
                }
            };
            run_solver(
                params.solver,
                &sys,
                &params.start,
                &ordering,
                restart.as_ref(),
                tracer.as_ref(),
            )
        }
    }
}
