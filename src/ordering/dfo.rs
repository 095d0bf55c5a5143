//! Depth-first ordering of the influence graph
//!
//! [`DFOrdering`] numbers the unknowns by an iterative depth-first
//! exploration of the influence relation, starting from the input unknowns
//! in their iteration order and then from any unknown not yet reached.
//! The numbering is a reverse post-order: roots come first, and an
//! influence `u -> v` with `v` ordered at or before `u` is a *retreating*
//! edge whose target is a loop head.
//!
//! The exploration keeps an explicit stack of enter/exit markers instead
//! of recursing: influence chains as long as the system itself (tens of
//! thousands of unknowns in dataflow problems) must not touch the call
//! stack.

use std::cmp::Ordering;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::eqs::finite::FiniteEquationSystem;
use crate::eqs::relation::Relation;
use crate::ordering::UnknownOrdering;

/// How an influence `u -> v` relates to a depth-first ordering.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InfluenceType {
    /// `v` is a descendant of `u` in the spanning forest.
    Advancing,
    /// `v` is ordered at or before `u`; the edge closes a loop.
    Retreating,
    /// Neither: the edge jumps between subtrees.
    Cross,
}

/// A depth-first numbering of the unknowns of a finite system.
pub struct DFOrdering<U> {
    dfn: FxHashMap<U, usize>,
    parent: FxHashMap<U, U>,
    heads: FxHashSet<U>,
    seq: Vec<U>,
}

/// Stack markers of the iterative depth-first search.
enum Visit<U> {
    Enter(U, Option<U>),
    Exit(U),
}

impl<U: Clone + Eq + std::hash::Hash> DFOrdering<U> {
    /// The depth-first ordering of `unknowns` under `infl`, rooted at
    /// `input_unknowns` first and at any remaining unknown after.
    pub fn new<'u>(
        unknowns: &'u [U],
        input_unknowns: impl IntoIterator<Item = &'u U>,
        infl: &Relation<U>,
    ) -> Self {
        let mut dfn: FxHashMap<U, usize> = FxHashMap::default();
        let mut parent: FxHashMap<U, U> = FxHashMap::default();
        let mut heads: FxHashSet<U> = FxHashSet::default();
        let mut visited: FxHashSet<U> = FxHashSet::default();
        let mut stack: Vec<Visit<U>> = Vec::new();
        // post-numbers count down so that later exits sort first
        let mut next_number = unknowns.len();

        let roots = input_unknowns.into_iter().chain(unknowns.iter());
        for root in roots {
            if visited.contains(root) {
                continue;
            }
            stack.push(Visit::Enter(root.clone(), None));
            while let Some(visit) = stack.pop() {
                match visit {
                    Visit::Enter(u, pred) => {
                        if visited.contains(&u) {
                            // reached again before being post-numbered:
                            // target of a retreating edge
                            if !dfn.contains_key(&u) {
                                heads.insert(u);
                            }
                            continue;
                        }
                        visited.insert(u.clone());
                        if let Some(p) = pred {
                            parent.insert(u.clone(), p);
                        }
                        stack.push(Visit::Exit(u.clone()));
                        let children: Vec<U> = infl.image(&u).cloned().collect();
                        for child in children.into_iter().rev() {
                            stack.push(Visit::Enter(child, Some(u.clone())));
                        }
                    }
                    Visit::Exit(u) => {
                        next_number -= 1;
                        dfn.insert(u, next_number);
                    }
                }
            }
        }

        let mut seq = unknowns.to_vec();
        seq.sort_by_key(|u| dfn.get(u).copied().unwrap_or(usize::MAX));

        DFOrdering {
            dfn,
            parent,
            heads,
            seq,
        }
    }

    /// The depth-first ordering of a finite system's influence graph.
    pub fn of<V>(eqs: &FiniteEquationSystem<U, V>) -> Self
    where
        U: 'static,
        V: Clone + 'static,
    {
        let infl = eqs.infl();
        DFOrdering::new(eqs.unknowns(), eqs.input_unknowns(), &infl)
    }

    /// The depth-first number of `u`.
    pub fn dfn(&self, u: &U) -> Option<usize> {
        self.dfn.get(u).copied()
    }

    /// The spanning-forest parent of `u`, if `u` is not a root.
    pub fn parent(&self, u: &U) -> Option<&U> {
        self.parent.get(u)
    }

    /// The loop heads: targets of retreating edges.
    pub fn heads(&self) -> &FxHashSet<U> {
        &self.heads
    }

    /// Categorize the influence `u -> v` with respect to this ordering.
    pub fn influence_type(&self, u: &U, v: &U) -> InfluenceType {
        if self.compare(v, u) != Ordering::Greater {
            return InfluenceType::Retreating;
        }
        // advancing iff the forest path from v climbs to u
        let mut cur = v;
        while let Some(p) = self.parent.get(cur) {
            if p == u {
                return InfluenceType::Advancing;
            }
            cur = p;
        }
        InfluenceType::Cross
    }
}

impl<U: Clone + Eq + std::hash::Hash> UnknownOrdering<U> for DFOrdering<U> {
    fn compare(&self, x: &U, y: &U) -> Ordering {
        let dx = self.dfn.get(x).copied().unwrap_or(usize::MAX);
        let dy = self.dfn.get(y).copied().unwrap_or(usize::MAX);
        dx.cmp(&dy)
    }

    fn is_head(&self, u: &U) -> bool {
        self.heads.contains(u)
    }

    fn to_seq(&self) -> Vec<U> {
        self.seq.clone()
    }
}

impl<U: fmt::Debug> fmt::Display for DFOrdering<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, u) in self.seq.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{u:?}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ordering_of(
        unknowns: &[i32],
        inputs: &[i32],
        pairs: &[(i32, i32)],
    ) -> DFOrdering<i32> {
        let infl = Relation::from_pairs(pairs.iter().copied());
        DFOrdering::new(unknowns, inputs.iter(), &infl)
    }

    #[test]
    fn chain_orders_from_the_root() {
        let dfo = ordering_of(&[0, 1, 2, 3], &[0], &[(0, 1), (1, 2), (2, 3)]);
        assert_eq!(dfo.to_seq(), vec![0, 1, 2, 3]);
        assert!(dfo.heads().is_empty());
    }

    #[test]
    fn back_edges_mark_heads() {
        // 0 -> 1 -> 2 -> 3 -> 1
        let dfo = ordering_of(&[0, 1, 2, 3], &[0], &[(0, 1), (1, 2), (2, 3), (3, 1)]);
        assert!(dfo.is_head(&1));
        assert!(!dfo.is_head(&0));
        assert_eq!(dfo.influence_type(&3, &1), InfluenceType::Retreating);
        assert_eq!(dfo.influence_type(&0, &1), InfluenceType::Advancing);
    }

    #[test]
    fn cross_edges_between_subtrees() {
        // 0 -> {1, 3}; 1 -> 2; 3 -> 2: second reach of 2 is a cross edge
        let dfo = ordering_of(&[0, 1, 2, 3], &[0], &[(0, 1), (0, 3), (1, 2), (3, 2)]);
        assert_eq!(dfo.influence_type(&3, &2), InfluenceType::Cross);
        assert!(!dfo.is_head(&2));
    }

    #[test]
    fn unreachable_unknowns_are_still_numbered() {
        let dfo = ordering_of(&[0, 1, 5], &[0], &[(0, 1)]);
        assert!(dfo.dfn(&5).is_some());
        assert_eq!(dfo.to_seq().len(), 3);
    }

    #[test]
    fn survives_a_long_chain() {
        let n = 10_000;
        let unknowns: Vec<i32> = (0..n).collect();
        let pairs: Vec<(i32, i32)> = (0..n - 1).map(|i| (i, i + 1)).collect();
        let dfo = ordering_of(&unknowns, &[0], &pairs);
        assert_eq!(dfo.to_seq().first(), Some(&0));
        assert_eq!(dfo.to_seq().last(), Some(&(n - 1)));
        assert!(dfo.heads().is_empty());
    }

    #[test]
    fn self_influence_makes_a_head() {
        let dfo = ordering_of(&[0, 1], &[0], &[(0, 1), (1, 1)]);
        assert!(dfo.is_head(&1));
    }
}
