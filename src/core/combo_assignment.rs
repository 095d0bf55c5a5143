//! Partial mappings from unknowns to combos
//!
//! A [`ComboAssignment`] chooses, per unknown, which combo (if any) to
//! apply when the body produces a new value. Undefined unknowns behave as
//! the right combo: the new value passes through untouched.
//!
//! The variants mirror how combos are handed out in practice:
//! - empty: no combo anywhere,
//! - constant: one shared combo for all unknowns,
//! - templated: a pristine clone of a template per unknown, memoized on
//!   first access so stateful combos never share counters,
//! - from a function: a per-unknown choice computed on demand,
//! - restricted: an existing assignment filtered by a predicate,
//! - warrowing: the elementwise fusion of a widening and a narrowing
//!   assignment.

use std::marker::PhantomData;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::core::combo::{self, BoxCombo, Combo};
use crate::core::domain::PreOrdered;

/// A partial function from unknowns to combos.
///
/// `apply` implements the combo at `u` when defined and falls back to
/// right-combo semantics (return the new value) otherwise. The aggregate
/// flags summarize all combos the assignment can ever produce; they drive
/// influence-relation augmentation and cloning decisions, so conservative
/// answers (`false`) are always sound.
pub trait ComboAssignment<U, V> {
    /// Whether a combo is installed at `u`.
    fn is_defined_at(&self, u: &U) -> bool;

    /// Combine `x` (old value) and `y` (new value) with the combo at `u`,
    /// or return `y` when no combo is installed there.
    fn apply(&mut self, u: &U, x: &V, y: &V) -> V;

    /// Whether the assignment is undefined everywhere.
    fn is_empty(&self) -> bool;

    /// Whether every combo this assignment produces is idempotent.
    fn combos_are_idempotent(&self) -> bool;

    /// Whether every combo this assignment produces is the right combo.
    fn combos_are_right(&self) -> bool;

    /// Whether every combo this assignment produces is immutable.
    fn combos_are_immutable(&self) -> bool;

    /// An independent copy with pristine per-unknown combo state.
    fn clone_box(&self) -> BoxComboAssignment<U, V>;
}

/// An owned, dynamically typed combo assignment.
pub type BoxComboAssignment<U, V> = Box<dyn ComboAssignment<U, V>>;

// ---------------------------------------------------------------------------
// Variants
// ---------------------------------------------------------------------------

struct Empty<U, V> {
    marker: PhantomData<(U, V)>,
}

impl<U: 'static, V: Clone + 'static> ComboAssignment<U, V> for Empty<U, V> {
    fn is_defined_at(&self, _u: &U) -> bool {
        false
    }

    fn apply(&mut self, _u: &U, _x: &V, y: &V) -> V {
        y.clone()
    }

    fn is_empty(&self) -> bool {
        true
    }

    fn combos_are_idempotent(&self) -> bool {
        true
    }

    fn combos_are_right(&self) -> bool {
        true
    }

    fn combos_are_immutable(&self) -> bool {
        true
    }

    fn clone_box(&self) -> BoxComboAssignment<U, V> {
        Box::new(Empty {
            marker: PhantomData,
        })
    }
}

/// One combo shared by every unknown.
///
/// Sharing is the point: a stateful combo here would mix counters across
/// unknowns, so stateful combos belong in [`templated`] instead.
struct Constant<U, V> {
    combo: BoxCombo<V>,
    marker: PhantomData<U>,
}

impl<U: 'static, V: 'static> ComboAssignment<U, V> for Constant<U, V> {
    fn is_defined_at(&self, _u: &U) -> bool {
        true
    }

    fn apply(&mut self, _u: &U, x: &V, y: &V) -> V {
        self.combo.apply(x, y)
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn combos_are_idempotent(&self) -> bool {
        self.combo.is_idempotent()
    }

    fn combos_are_right(&self) -> bool {
        self.combo.is_right()
    }

    fn combos_are_immutable(&self) -> bool {
        self.combo.is_immutable()
    }

    fn clone_box(&self) -> BoxComboAssignment<U, V> {
        Box::new(Constant {
            combo: self.combo.clone_box(),
            marker: PhantomData,
        })
    }
}

/// A pristine clone of `template` per unknown, created on first access.
struct Templated<U, V> {
    template: BoxCombo<V>,
    memo: FxHashMap<U, BoxCombo<V>>,
}

impl<U, V> ComboAssignment<U, V> for Templated<U, V>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: 'static,
{
    fn is_defined_at(&self, _u: &U) -> bool {
        true
    }

    fn apply(&mut self, u: &U, x: &V, y: &V) -> V {
        let template = &self.template;
        self.memo
            .entry(u.clone())
            .or_insert_with(|| template.clone_box())
            .apply(x, y)
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn combos_are_idempotent(&self) -> bool {
        self.template.is_idempotent()
    }

    fn combos_are_right(&self) -> bool {
        self.template.is_right()
    }

    fn combos_are_immutable(&self) -> bool {
        self.template.is_immutable()
    }

    fn clone_box(&self) -> BoxComboAssignment<U, V> {
        Box::new(Templated {
            template: self.template.clone_box(),
            memo: FxHashMap::default(),
        })
    }
}

/// Per-unknown combos chosen by a function, memoized per key.
struct FromFn<U, V> {
    f: Rc<dyn Fn(&U) -> Option<BoxCombo<V>>>,
    memo: FxHashMap<U, Option<BoxCombo<V>>>,
}

impl<U, V> ComboAssignment<U, V> for FromFn<U, V>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + 'static,
{
    fn is_defined_at(&self, u: &U) -> bool {
        match self.memo.get(u) {
            Some(slot) => slot.is_some(),
            None => (self.f)(u).is_some(),
        }
    }

    fn apply(&mut self, u: &U, x: &V, y: &V) -> V {
        let f = &self.f;
        match self.memo.entry(u.clone()).or_insert_with(|| f(u)) {
            Some(c) => c.apply(x, y),
            None => y.clone(),
        }
    }

    fn is_empty(&self) -> bool {
        false
    }

    fn combos_are_idempotent(&self) -> bool {
        false
    }

    fn combos_are_right(&self) -> bool {
        false
    }

    fn combos_are_immutable(&self) -> bool {
        false
    }

    fn clone_box(&self) -> BoxComboAssignment<U, V> {
        Box::new(FromFn {
            f: Rc::clone(&self.f),
            memo: FxHashMap::default(),
        })
    }
}

/// An assignment filtered by a domain predicate.
struct Restricted<U, V> {
    inner: BoxComboAssignment<U, V>,
    pred: Rc<dyn Fn(&U) -> bool>,
}

impl<U: 'static, V: Clone + 'static> ComboAssignment<U, V> for Restricted<U, V> {
    fn is_defined_at(&self, u: &U) -> bool {
        (self.pred)(u) && self.inner.is_defined_at(u)
    }

    fn apply(&mut self, u: &U, x: &V, y: &V) -> V {
        if (self.pred)(u) {
            self.inner.apply(u, x, y)
        } else {
            y.clone()
        }
    }

    fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    fn combos_are_idempotent(&self) -> bool {
        self.inner.combos_are_idempotent()
    }

    fn combos_are_right(&self) -> bool {
        self.inner.combos_are_right()
    }

    fn combos_are_immutable(&self) -> bool {
        self.inner.combos_are_immutable()
    }

    fn clone_box(&self) -> BoxComboAssignment<U, V> {
        Box::new(Restricted {
            inner: self.inner.clone_box(),
            pred: Rc::clone(&self.pred),
        })
    }
}

/// Elementwise warrowing of a widening and a narrowing assignment.
struct WarrowingAssignment<U, V> {
    widenings: BoxComboAssignment<U, V>,
    narrowings: BoxComboAssignment<U, V>,
}

impl<U, V> ComboAssignment<U, V> for WarrowingAssignment<U, V>
where
    U: 'static,
    V: PreOrdered + Clone + 'static,
{
    fn is_defined_at(&self, u: &U) -> bool {
        self.widenings.is_defined_at(u) || self.narrowings.is_defined_at(u)
    }

    fn apply(&mut self, u: &U, x: &V, y: &V) -> V {
        if y.lteq(x) {
            self.narrowings.apply(u, x, y)
        } else {
            self.widenings.apply(u, x, y)
        }
    }

    fn is_empty(&self) -> bool {
        self.widenings.is_empty() && self.narrowings.is_empty()
    }

    fn combos_are_idempotent(&self) -> bool {
        false
    }

    fn combos_are_right(&self) -> bool {
        self.widenings.combos_are_right() && self.narrowings.combos_are_right()
    }

    fn combos_are_immutable(&self) -> bool {
        self.widenings.combos_are_immutable() && self.narrowings.combos_are_immutable()
    }

    fn clone_box(&self) -> BoxComboAssignment<U, V> {
        Box::new(WarrowingAssignment {
            widenings: self.widenings.clone_box(),
            narrowings: self.narrowings.clone_box(),
        })
    }
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

/// The assignment with no combo anywhere.
pub fn empty<U: 'static, V: Clone + 'static>() -> BoxComboAssignment<U, V> {
    Box::new(Empty {
        marker: PhantomData,
    })
}

/// The same combo at every unknown.
///
/// The combo instance is shared across unknowns, which is only correct for
/// immutable combos; install a stateful combo with [`templated`].
pub fn constant<U: 'static, V: 'static>(combo: BoxCombo<V>) -> BoxComboAssignment<U, V> {
    Box::new(Constant {
        combo,
        marker: PhantomData,
    })
}

/// A fresh clone of `template` at every unknown, memoized per key.
pub fn templated<U, V>(template: BoxCombo<V>) -> BoxComboAssignment<U, V>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: 'static,
{
    Box::new(Templated {
        template,
        memo: FxHashMap::default(),
    })
}

/// Per-unknown combos chosen by `f`.
///
/// `f` must be pure; the combo it returns for a key is memoized on first
/// use so per-key state sticks to that key.
pub fn from_fn<U, V>(f: impl Fn(&U) -> Option<BoxCombo<V>> + 'static) -> BoxComboAssignment<U, V>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + 'static,
{
    Box::new(FromFn {
        f: Rc::new(f),
        memo: FxHashMap::default(),
    })
}

/// `combos` restricted to the unknowns satisfying `pred`.
///
/// Restricting the empty assignment is the empty assignment.
pub fn restrict<U: 'static, V: Clone + 'static>(
    combos: BoxComboAssignment<U, V>,
    pred: impl Fn(&U) -> bool + 'static,
) -> BoxComboAssignment<U, V> {
    if combos.is_empty() {
        combos
    } else {
        Box::new(Restricted {
            inner: combos,
            pred: Rc::new(pred),
        })
    }
}

/// The elementwise warrowing of `widenings` and `narrowings`.
///
/// Two right-everywhere assignments collapse to the constant right combo.
pub fn warrowing<U, V>(
    widenings: BoxComboAssignment<U, V>,
    narrowings: BoxComboAssignment<U, V>,
) -> BoxComboAssignment<U, V>
where
    U: 'static,
    V: PreOrdered + Clone + 'static,
{
    if widenings.combos_are_right() && narrowings.combos_are_right() {
        constant(combo::right())
    } else {
        Box::new(WarrowingAssignment {
            widenings,
            narrowings,
        })
    }
}
