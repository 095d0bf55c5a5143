//! Total assignments from unknowns to values
//!
//! An [`Assignment`] is a pure total function `U -> V`: two reads of the
//! same unknown return equal values. Bodies receive the current assignment
//! through this trait, and solvers produce their result as a
//! [`MapAssignment`], the mutable flavor that remembers exactly which
//! unknowns were written.
//!
//! Standard flavors, mirrored by the free constructors at the bottom:
//! - constant: every unknown maps to one fixed value,
//! - functional: backed by a closure, carrying a label for display,
//! - conditional: a single-key override layered over another assignment,
//! - map-backed: a finite map with a fallback (assignment, constant, or
//!   hard error on a miss).

use std::fmt;
use std::rc::Rc;

use rustc_hash::FxHashMap;

use crate::error::FixError;

/// A total function from unknowns to values.
///
/// Implementations must be pure: `get` may not depend on hidden mutable
/// state. Any `Fn(&U) -> V` closure is an assignment.
pub trait Assignment<U, V> {
    /// The value of the unknown `u`.
    fn get(&self, u: &U) -> V;
}

impl<U, V, F> Assignment<U, V> for F
where
    F: Fn(&U) -> V,
{
    #[inline]
    fn get(&self, u: &U) -> V {
        self(u)
    }
}

/// An assignment that can be updated in place.
///
/// `unknowns` reports only the keys that were explicitly written with
/// `update`; values served from the underlying fallback are never reported,
/// even when they were read. A key written back to its fallback value is
/// still reported as modified.
pub trait MutableAssignment<U, V>: Assignment<U, V> {
    /// Set the value of `u` to `v`.
    fn update(&mut self, u: U, v: V);

    /// Whether `u` was explicitly written.
    fn is_defined_at(&self, u: &U) -> bool;

    /// The unknowns explicitly written so far.
    fn unknowns(&self) -> Vec<U>;
}

// ---------------------------------------------------------------------------
// Concrete flavors
// ---------------------------------------------------------------------------

/// Assignment returning the same value for every unknown.
#[derive(Clone)]
pub struct ConstantAssignment<V> {
    value: V,
}

impl<U, V: Clone> Assignment<U, V> for ConstantAssignment<V> {
    #[inline]
    fn get(&self, _u: &U) -> V {
        self.value.clone()
    }
}

impl<V: fmt::Debug> fmt::Display for ConstantAssignment<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "constant {:?}", self.value)
    }
}

/// Assignment backed by a closure, labeled for display.
pub struct FnAssignment<U, V> {
    f: Rc<dyn Fn(&U) -> V>,
    label: String,
}

impl<U, V> Clone for FnAssignment<U, V> {
    fn clone(&self) -> Self {
        FnAssignment {
            f: Rc::clone(&self.f),
            label: self.label.clone(),
        }
    }
}

impl<U, V> Assignment<U, V> for FnAssignment<U, V> {
    #[inline]
    fn get(&self, u: &U) -> V {
        (self.f)(u)
    }
}

impl<U, V> fmt::Display for FnAssignment<U, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

/// Single-key override `[u -> v]` layered over another assignment.
pub struct ConditionalAssignment<U, V> {
    key: U,
    value: V,
    over: Rc<dyn Assignment<U, V>>,
}

impl<U: Eq, V: Clone> Assignment<U, V> for ConditionalAssignment<U, V> {
    fn get(&self, u: &U) -> V {
        if *u == self.key {
            self.value.clone()
        } else {
            self.over.get(u)
        }
    }
}

impl<U: fmt::Debug, V: fmt::Debug> fmt::Display for ConditionalAssignment<U, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?} -> {:?}] over ...", self.key, self.value)
    }
}

/// What a [`MapAssignment`] falls back to on keys it does not hold.
enum Fallback<U, V> {
    Assignment(Rc<dyn Assignment<U, V>>),
    Constant(V),
    Undefined,
}

impl<U, V: Clone> Clone for Fallback<U, V> {
    fn clone(&self) -> Self {
        match self {
            Fallback::Assignment(a) => Fallback::Assignment(Rc::clone(a)),
            Fallback::Constant(v) => Fallback::Constant(v.clone()),
            Fallback::Undefined => Fallback::Undefined,
        }
    }
}

/// Finite map layered over a fallback; the default mutable assignment.
///
/// Built either as a plain partial map (`from_map`, optionally with a
/// default), or as the updatable overlay of an initial assignment
/// (`updating`) that solvers use to accumulate their solution.
pub struct MapAssignment<U, V> {
    map: FxHashMap<U, V>,
    fallback: Fallback<U, V>,
}

impl<U: Clone + Eq + std::hash::Hash, V: Clone> MapAssignment<U, V> {
    /// A partial assignment holding exactly the entries of `map`.
    ///
    /// Reads outside the map are a contract violation, see [`Self::get`].
    pub fn from_map(map: FxHashMap<U, V>) -> Self {
        MapAssignment {
            map,
            fallback: Fallback::Undefined,
        }
    }

    /// A map-backed assignment falling back to a constant.
    pub fn with_default(map: FxHashMap<U, V>, default: V) -> Self {
        MapAssignment {
            map,
            fallback: Fallback::Constant(default),
        }
    }

    /// An empty mutable overlay of `initial`.
    ///
    /// This is the factory solvers use: reads pass through to `initial`
    /// until the key is written, and `unknowns` reports only written keys.
    pub fn updating(initial: Rc<dyn Assignment<U, V>>) -> Self {
        MapAssignment {
            map: FxHashMap::default(),
            fallback: Fallback::Assignment(initial),
        }
    }

    /// The value of `u`, or an error if `u` is outside the domain.
    pub fn try_get(&self, u: &U) -> Result<V, FixError>
    where
        U: fmt::Debug,
    {
        if let Some(v) = self.map.get(u) {
            return Ok(v.clone());
        }
        match &self.fallback {
            Fallback::Assignment(a) => Ok(a.get(u)),
            Fallback::Constant(v) => Ok(v.clone()),
            Fallback::Undefined => Err(FixError::undefined_unknown(u)),
        }
    }
}

impl<U: Clone + Eq + std::hash::Hash, V: Clone> Assignment<U, V> for MapAssignment<U, V> {
    /// The value of `u`.
    ///
    /// # Panics
    ///
    /// Panics when `u` is missing from a map built with no fallback
    /// ([`MapAssignment::from_map`]); use [`MapAssignment::try_get`] to
    /// observe that case as a [`FixError::UndefinedUnknown`].
    fn get(&self, u: &U) -> V {
        if let Some(v) = self.map.get(u) {
            return v.clone();
        }
        match &self.fallback {
            Fallback::Assignment(a) => a.get(u),
            Fallback::Constant(v) => v.clone(),
            Fallback::Undefined => panic!("assignment is undefined at the requested unknown"),
        }
    }
}

impl<U: Clone + Eq + std::hash::Hash, V: Clone> MutableAssignment<U, V> for MapAssignment<U, V> {
    fn update(&mut self, u: U, v: V) {
        self.map.insert(u, v);
    }

    #[inline]
    fn is_defined_at(&self, u: &U) -> bool {
        self.map.contains_key(u)
    }

    fn unknowns(&self) -> Vec<U> {
        self.map.keys().cloned().collect()
    }
}

impl<U: Clone, V: Clone> Clone for MapAssignment<U, V> {
    fn clone(&self) -> Self {
        MapAssignment {
            map: self.map.clone(),
            fallback: self.fallback.clone(),
        }
    }
}

impl<U: fmt::Debug, V: fmt::Debug> fmt::Display for MapAssignment<U, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, (u, v)) in self.map.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{u:?} -> {v:?}")?;
        }
        match &self.fallback {
            Fallback::Assignment(_) => write!(f, "] over initial"),
            Fallback::Constant(v) => write!(f, "] else {v:?}"),
            Fallback::Undefined => write!(f, "]"),
        }
    }
}

// ---------------------------------------------------------------------------
// Constructors
// ---------------------------------------------------------------------------

/// The assignment mapping every unknown to `value`.
pub fn constant<U: 'static, V: Clone + 'static>(value: V) -> Rc<dyn Assignment<U, V>> {
    Rc::new(ConstantAssignment { value })
}

/// An assignment backed by `f`, rendered as `label` by `Display`.
pub fn from_fn<U: 'static, V: 'static>(
    f: impl Fn(&U) -> V + 'static,
    label: impl Into<String>,
) -> Rc<dyn Assignment<U, V>> {
    Rc::new(FnAssignment {
        f: Rc::new(f),
        label: label.into(),
    })
}

/// A partial assignment holding exactly the entries of `map`.
pub fn from_map<U, V>(map: FxHashMap<U, V>) -> Rc<dyn Assignment<U, V>>
where
    U: Clone + Eq + std::hash::Hash + 'static,
    V: Clone + 'static,
{
    Rc::new(MapAssignment::from_map(map))
}

/// The assignment `[u -> v]` over `base`.
pub fn updated<U, V>(base: Rc<dyn Assignment<U, V>>, u: U, v: V) -> Rc<dyn Assignment<U, V>>
where
    U: Eq + 'static,
    V: Clone + 'static,
{
    Rc::new(ConditionalAssignment {
        key: u,
        value: v,
        over: base,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_is_total() {
        let rho = constant::<i32, i64>(7);
        assert_eq!(rho.get(&0), 7);
        assert_eq!(rho.get(&123), 7);
    }

    #[test]
    fn conditional_overrides_one_key() {
        let rho = updated(constant::<i32, i64>(0), 3, 99);
        assert_eq!(rho.get(&3), 99);
        assert_eq!(rho.get(&4), 0);
    }

    #[test]
    fn updating_tracks_only_written_keys() {
        let mut rho = MapAssignment::updating(constant::<i32, i64>(1));
        assert_eq!(rho.get(&5), 1);
        assert!(rho.unknowns().is_empty());

        rho.update(5, 2);
        rho.update(8, 1); // written back to the fallback value
        assert_eq!(rho.get(&5), 2);
        assert!(rho.is_defined_at(&8));

        let mut seen = rho.unknowns();
        seen.sort_unstable();
        assert_eq!(seen, vec![5, 8]);
    }

    #[test]
    fn from_map_errors_outside_domain() {
        let mut m = FxHashMap::default();
        m.insert(1, 10_i64);
        let rho = MapAssignment::from_map(m);
        assert_eq!(rho.try_get(&1).unwrap(), 10);
        assert!(matches!(
            rho.try_get(&2),
            Err(FixError::UndefinedUnknown { .. })
        ));
    }

    #[test]
    fn closures_are_assignments() {
        let rho = |u: &i32| i64::from(*u) * 2;
        assert_eq!(Assignment::get(&rho, &21), 42);
    }
}
