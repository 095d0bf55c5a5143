//! Binary value combinators: widenings, narrowings and friends
//!
//! A [`Combo`] combines the previous value of an unknown with its freshly
//! computed value. Widening combos force termination over domains without
//! the ascending chain condition; narrowing combos refine the result of an
//! ascending phase; warrowing combos fuse the two, switching on the
//! direction of change.
//!
//! Combos are blueprints as much as values: a combo installed at many
//! unknowns must not share internal state between them, so every combo
//! knows how to produce a behaviorally equivalent fresh copy of itself via
//! [`Combo::clone_box`]. Immutable combos may hand out shared copies; the
//! only stateful built-in is [`cascade`], which counts its invocations.

use std::rc::Rc;

use crate::core::domain::{Magma, PreOrdered, UpperBound};

/// A binary operator on values, combining an old value with a new one.
pub trait Combo<V> {
    /// Combine the previous value `x` with the newly computed value `y`.
    ///
    /// May mutate internal state; among the built-ins only cascades do.
    fn apply(&mut self, x: &V, y: &V) -> V;

    /// Whether repeated application with the same arguments is stable:
    /// `apply(x, apply(x, y)) == apply(x, y)`.
    fn is_idempotent(&self) -> bool;

    /// Whether this combo always returns its second argument.
    fn is_right(&self) -> bool {
        false
    }

    /// Whether this combo carries no mutable state.
    fn is_immutable(&self) -> bool;

    /// A behaviorally equivalent fresh copy.
    ///
    /// When `is_immutable` is false the copy must start from pristine
    /// internal state; an immutable combo may share its innards.
    fn clone_box(&self) -> BoxCombo<V>;
}

/// An owned, dynamically typed combo.
pub type BoxCombo<V> = Box<dyn Combo<V>>;

// ---------------------------------------------------------------------------
// Built-ins
// ---------------------------------------------------------------------------

/// Combo returning its first argument.
struct Left;

impl<V: Clone + 'static> Combo<V> for Left {
    #[inline]
    fn apply(&mut self, x: &V, _y: &V) -> V {
        x.clone()
    }

    fn is_idempotent(&self) -> bool {
        true
    }

    fn is_immutable(&self) -> bool {
        true
    }

    fn clone_box(&self) -> BoxCombo<V> {
        Box::new(Left)
    }
}

/// Combo returning its second argument.
struct Right;

impl<V: Clone + 'static> Combo<V> for Right {
    #[inline]
    fn apply(&mut self, _x: &V, y: &V) -> V {
        y.clone()
    }

    fn is_idempotent(&self) -> bool {
        true
    }

    fn is_right(&self) -> bool {
        true
    }

    fn is_immutable(&self) -> bool {
        true
    }

    fn clone_box(&self) -> BoxCombo<V> {
        Box::new(Right)
    }
}

/// Stateless combo wrapping a plain function.
struct FromFn<V> {
    f: Rc<dyn Fn(&V, &V) -> V>,
    idempotent: bool,
}

impl<V: 'static> Combo<V> for FromFn<V> {
    #[inline]
    fn apply(&mut self, x: &V, y: &V) -> V {
        (self.f)(x, y)
    }

    fn is_idempotent(&self) -> bool {
        self.idempotent
    }

    fn is_immutable(&self) -> bool {
        true
    }

    fn clone_box(&self) -> BoxCombo<V> {
        Box::new(FromFn {
            f: Rc::clone(&self.f),
            idempotent: self.idempotent,
        })
    }
}

/// Combo using `first` for the first `delay` applications, `second` after.
///
/// The step counter is per-instance state: each unknown holding a cascade
/// must hold its own copy.
struct Cascade<V> {
    first: BoxCombo<V>,
    delay: usize,
    second: BoxCombo<V>,
    steps: usize,
}

impl<V: 'static> Combo<V> for Cascade<V> {
    fn apply(&mut self, x: &V, y: &V) -> V {
        if self.steps < self.delay {
            self.steps += 1;
            self.first.apply(x, y)
        } else {
            self.second.apply(x, y)
        }
    }

    fn is_idempotent(&self) -> bool {
        false
    }

    fn is_immutable(&self) -> bool {
        false
    }

    fn clone_box(&self) -> BoxCombo<V> {
        Box::new(Cascade {
            first: self.first.clone_box(),
            delay: self.delay,
            second: self.second.clone_box(),
            steps: 0,
        })
    }
}

/// Fused widening/narrowing, selected by the direction of change.
struct Warrowing<V> {
    widening: BoxCombo<V>,
    narrowing: BoxCombo<V>,
}

impl<V: PreOrdered + 'static> Combo<V> for Warrowing<V> {
    fn apply(&mut self, x: &V, y: &V) -> V {
        if y.lteq(x) {
            self.narrowing.apply(x, y)
        } else {
            self.widening.apply(x, y)
        }
    }

    fn is_idempotent(&self) -> bool {
        false
    }

    fn is_immutable(&self) -> bool {
        self.widening.is_immutable() && self.narrowing.is_immutable()
    }

    fn clone_box(&self) -> BoxCombo<V> {
        Box::new(Warrowing {
            widening: self.widening.clone_box(),
            narrowing: self.narrowing.clone_box(),
        })
    }
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

/// The combo returning its first argument.
pub fn left<V: Clone + 'static>() -> BoxCombo<V> {
    Box::new(Left)
}

/// The combo returning its second argument.
pub fn right<V: Clone + 'static>() -> BoxCombo<V> {
    Box::new(Right)
}

/// A stateless combo computed by `f`.
///
/// `idempotent` declares whether `f(x, f(x, y)) == f(x, y)`; the flag
/// decides whether installing the combo forces a self-influence on the
/// unknown it is attached to.
pub fn from_fn<V: 'static>(f: impl Fn(&V, &V) -> V + 'static, idempotent: bool) -> BoxCombo<V> {
    Box::new(FromFn {
        f: Rc::new(f),
        idempotent,
    })
}

/// The upper-bound combo of the domain.
pub fn upper_bound<V: UpperBound + 'static>() -> BoxCombo<V> {
    from_fn(|x: &V, y: &V| x.upper_bound(y), true)
}

/// The magma-combine combo of the domain.
pub fn magma<V: Magma + 'static>() -> BoxCombo<V> {
    from_fn(|x: &V, y: &V| x.magma_combine(y), false)
}

/// A combo using `first` for the first `delay` applications, then `second`.
///
/// Collapses to a stateless combo where possible: two right-combos cascade
/// to `right`, and a zero delay is just `second`.
pub fn cascade<V: Clone + 'static>(
    first: BoxCombo<V>,
    delay: usize,
    second: BoxCombo<V>,
) -> BoxCombo<V> {
    if first.is_right() && second.is_right() {
        right()
    } else if delay == 0 {
        second
    } else {
        Box::new(Cascade {
            first,
            delay,
            second,
            steps: 0,
        })
    }
}

/// The warrowing of a widening and a narrowing.
///
/// Applies `narrowing` when the new value is below the old one, `widening`
/// otherwise. Two right-combos collapse to `right`.
pub fn warrowing<V: PreOrdered + Clone + 'static>(
    widening: BoxCombo<V>,
    narrowing: BoxCombo<V>,
) -> BoxCombo<V> {
    if widening.is_right() && narrowing.is_right() {
        right()
    } else {
        Box::new(Warrowing {
            widening,
            narrowing,
        })
    }
}

/// `combo` delayed by `delay` steps: `cascade(right, delay, combo)`.
pub fn delayed<V: Clone + 'static>(combo: BoxCombo<V>, delay: usize) -> BoxCombo<V> {
    cascade(right(), delay, combo)
}
