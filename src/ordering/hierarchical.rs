//! Hierarchical (weak topological) orderings
//!
//! A [`HierarchicalOrdering`] is a parenthesized sequence of unknowns:
//! every loop head opens a component, and the hierarchical solver iterates
//! each component until it stabilizes before moving on. The sequence is
//! either refined from an existing ordering (every head opens a
//! parenthesis, all parentheses close at the end) or given literally as a
//! sequence of [`HOElement`]s, in which case it is validated on
//! construction.

use std::cmp::Ordering;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::FixError;
use crate::ordering::UnknownOrdering;

/// One element of a hierarchical-ordering sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HOElement<U> {
    /// An opening parenthesis.
    Left,
    /// A closing parenthesis.
    Right,
    /// An unknown.
    Val(U),
}

/// A validated parenthesized sequence of unknowns.
pub struct HierarchicalOrdering<U> {
    elements: Vec<HOElement<U>>,
    position: FxHashMap<U, usize>,
    heads: FxHashSet<U>,
}

impl<U: Clone + Eq + std::hash::Hash> HierarchicalOrdering<U> {
    /// Build an ordering from a literal element sequence.
    ///
    /// The sequence must be well formed: parentheses balance, no group is
    /// empty, and at least one unknown appears.
    pub fn from_sequence(elements: Vec<HOElement<U>>) -> Result<Self, FixError> {
        let mut depth = 0_usize;
        let mut position = FxHashMap::default();
        let mut heads = FxHashSet::default();
        let mut vals = 0_usize;
        let mut prev_left = false;

        for (i, el) in elements.iter().enumerate() {
            match el {
                HOElement::Left => {
                    depth += 1;
                    prev_left = true;
                }
                HOElement::Right => {
                    if depth == 0 {
                        return Err(FixError::invalid_sequence(
                            "closing parenthesis without a matching opening one",
                        ));
                    }
                    if prev_left {
                        return Err(FixError::invalid_sequence("empty parenthesized group"));
                    }
                    depth -= 1;
                    prev_left = false;
                }
                HOElement::Val(u) => {
                    if position.insert(u.clone(), i).is_some() {
                        return Err(FixError::invalid_sequence(
                            "an unknown appears more than once",
                        ));
                    }
                    if prev_left {
                        heads.insert(u.clone());
                    }
                    vals += 1;
                    prev_left = false;
                }
            }
        }
        if depth != 0 {
            return Err(FixError::invalid_sequence("unclosed parenthesis"));
        }
        if vals == 0 {
            return Err(FixError::invalid_sequence("no unknowns in the sequence"));
        }

        Ok(HierarchicalOrdering {
            elements,
            position,
            heads,
        })
    }

    /// Refine `ordering` into a hierarchical one: every head opens a
    /// parenthesis and all open parentheses close after the last unknown.
    pub fn from_ordering(ordering: &impl UnknownOrdering<U>) -> Self {
        let seq = ordering.to_seq();
        let mut elements = Vec::with_capacity(seq.len() + 2);
        let mut position = FxHashMap::default();
        let mut heads = FxHashSet::default();
        let mut open = 0_usize;

        for u in seq {
            if ordering.is_head(&u) {
                elements.push(HOElement::Left);
                open += 1;
                heads.insert(u.clone());
            }
            position.insert(u.clone(), elements.len());
            elements.push(HOElement::Val(u));
        }
        for _ in 0..open {
            elements.push(HOElement::Right);
        }

        HierarchicalOrdering {
            elements,
            position,
            heads,
        }
    }

    /// The raw element sequence.
    pub fn elements(&self) -> &[HOElement<U>] {
        &self.elements
    }
}

impl<U: Clone + Eq + std::hash::Hash> UnknownOrdering<U> for HierarchicalOrdering<U> {
    fn compare(&self, x: &U, y: &U) -> Ordering {
        let px = self.position.get(x).copied().unwrap_or(usize::MAX);
        let py = self.position.get(y).copied().unwrap_or(usize::MAX);
        px.cmp(&py)
    }

    fn is_head(&self, u: &U) -> bool {
        self.heads.contains(u)
    }

    fn to_seq(&self) -> Vec<U> {
        self.elements
            .iter()
            .filter_map(|el| match el {
                HOElement::Val(u) => Some(u.clone()),
                _ => None,
            })
            .collect()
    }
}

impl<U: fmt::Debug> fmt::Display for HierarchicalOrdering<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, el) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            match el {
                HOElement::Left => write!(f, "(")?,
                HOElement::Right => write!(f, ")")?,
                HOElement::Val(u) => write!(f, "{u:?}")?,
            }
        }
        Ok(())
    }
}
