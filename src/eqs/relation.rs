//! Influence relations between unknowns
//!
//! A [`Relation`] is a multi-valued mapping from unknowns to unknowns. The
//! finite equation systems use it as their influence relation: `v` is in
//! the image of `u` when a change of `u` can change the body of `v`, and
//! worklist-style solvers trust it completely when scheduling
//! re-evaluations.

use rustc_hash::FxHashMap;

/// A multi-valued mapping over unknowns.
///
/// The diagonal flag adds every unknown to its own image without touching
/// the stored map; it is set when a non-idempotent combo makes each unknown
/// influence itself.
#[derive(Clone, Debug)]
pub struct Relation<U> {
    map: FxHashMap<U, Vec<U>>,
    diagonal: bool,
}

impl<U: Clone + Eq + std::hash::Hash> Relation<U> {
    /// The relation holding exactly the images of `map`.
    pub fn from_map(map: FxHashMap<U, Vec<U>>) -> Self {
        Relation {
            map,
            diagonal: false,
        }
    }

    /// The relation holding the given `(from, to)` pairs, in order.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (U, U)>) -> Self {
        let mut map: FxHashMap<U, Vec<U>> = FxHashMap::default();
        for (from, to) in pairs {
            let image = map.entry(from).or_default();
            if !image.contains(&to) {
                image.push(to);
            }
        }
        Relation {
            map,
            diagonal: false,
        }
    }

    /// This relation augmented with `(u, u)` for every unknown.
    pub fn with_diagonal(mut self) -> Self {
        self.diagonal = true;
        self
    }

    /// The image of `u`.
    pub fn image<'s>(&'s self, u: &'s U) -> impl Iterator<Item = &'s U> {
        let explicit = self.map.get(u).map_or(&[] as &[U], Vec::as_slice);
        let diag = self.diagonal && !explicit.contains(u);
        explicit.iter().chain(diag.then_some(u))
    }

    /// The unknowns whose image contains `u`. Linear scan; meant for tests
    /// and diagnostics, not for solver loops.
    pub fn inverse_image(&self, u: &U) -> Vec<U> {
        let mut inv: Vec<U> = self
            .map
            .iter()
            .filter(|(_, image)| image.contains(u))
            .map(|(from, _)| from.clone())
            .collect();
        if self.diagonal && !inv.contains(u) {
            inv.push(u.clone());
        }
        inv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_follows_insertion_order() {
        let r = Relation::from_pairs([(1, 2), (1, 3), (2, 3)]);
        let image: Vec<i32> = r.image(&1).copied().collect();
        assert_eq!(image, vec![2, 3]);
        assert!(r.image(&3).next().is_none());
    }

    #[test]
    fn diagonal_augments_every_image() {
        let r = Relation::from_pairs([(1, 2)]).with_diagonal();
        let image1: Vec<i32> = r.image(&1).copied().collect();
        assert_eq!(image1, vec![2, 1]);
        let image3: Vec<i32> = r.image(&3).copied().collect();
        assert_eq!(image3, vec![3]);
    }

    #[test]
    fn diagonal_does_not_duplicate() {
        let r = Relation::from_pairs([(1, 1), (1, 2)]).with_diagonal();
        let image: Vec<i32> = r.image(&1).copied().collect();
        assert_eq!(image, vec![1, 2]);
    }

    #[test]
    fn inverse_image_scans_the_map() {
        let r = Relation::from_pairs([(1, 3), (2, 3)]);
        let mut inv = r.inverse_image(&3);
        inv.sort_unstable();
        assert_eq!(inv, vec![1, 2]);
    }
}
