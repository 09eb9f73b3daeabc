//! Set algebra over two trees (§4.8): union, distinct union, intersection,
//! bag-intersection, subtracting, bag-subtracting, symmetric difference,
//! bag-symmetric-difference, plus the subset-against-sorted-sequence
//! variants.
//!
//! The `Merger` walks a [`StrongPath`] into each input in lockstep and
//! funnels output through a [`Builder`], so the result is built bottom-up
//! in the same pass as the scan rather than element-by-element insertion.
//!
//! Advancing is element-by-element in general (the `O(n + m)` bound §4.8
//! requires), except where both scans sit at the first element of the
//! identical (same-allocation) leaf: `copy_common_from_second` and
//! `skip_common` check `Shared::ptr_eq` there and, on a match, link or skip
//! the whole leaf in one step (`Builder::append_subtree` for the copying
//! case) instead of walking its elements one at a time — the
//! aligned-shared-subtree shortcut, scoped to leaf-sized runs rather than
//! arbitrary internal subtrees (see DESIGN.md).

use crate::builder::Builder;
use crate::order::Order;
use crate::path::strong::StrongPath;
use crate::shared::Shared;
use crate::tree::Tree;

#[derive(Clone, Copy)]
enum Limit {
    Excluding,
    Including,
}

struct Merger<K, V> {
    a: StrongPath<K, V>,
    b: StrongPath<K, V>,
    builder: Builder<K, V>,
}

impl<K: Ord + Clone, V: Clone> Merger<K, V> {
    fn new(order: Order, a_root: Shared<K, V>, b_root: Shared<K, V>) -> Self {
        Merger {
            a: StrongPath::seek_offset(a_root, 0),
            b: StrongPath::seek_offset(b_root, 0),
            builder: Builder::new(order, 1.0),
        }
    }

    fn key_a(&self) -> Option<&K> {
        self.a.current().map(|(k, _)| k)
    }

    fn key_b(&self) -> Option<&K> {
        self.b.current().map(|(k, _)| k)
    }

    fn either_exhausted(&self) -> bool {
        self.key_a().is_none() || self.key_b().is_none()
    }

    /// Copy from `a` forward while its key stays below (or at-or-below,
    /// under `Including`) `b`'s current key.
    fn copy_from_first(&mut self, limit: Limit) {
        while let Some(ka) = self.key_a() {
            let proceed = match self.key_b() {
                None => true,
                Some(kb) => match limit {
                    Limit::Excluding => ka < kb,
                    Limit::Including => ka <= kb,
                },
            };
            if !proceed {
                break;
            }
            let elem = self.a.current().unwrap().clone();
            self.builder.append(elem);
            self.a.advance();
        }
    }

    fn copy_from_second(&mut self, limit: Limit) {
        while let Some(kb) = self.key_b() {
            let proceed = match self.key_a() {
                None => true,
                Some(ka) => match limit {
                    Limit::Excluding => kb < ka,
                    Limit::Including => kb <= ka,
                },
            };
            if !proceed {
                break;
            }
            let elem = self.b.current().unwrap().clone();
            self.builder.append(elem);
            self.b.advance();
        }
    }

    fn skip_from_first(&mut self, limit: Limit) {
        while let Some(ka) = self.key_a() {
            let proceed = match self.key_b() {
                None => true,
                Some(kb) => match limit {
                    Limit::Excluding => ka < kb,
                    Limit::Including => ka <= kb,
                },
            };
            if !proceed {
                break;
            }
            self.a.advance();
        }
    }

    fn skip_from_second(&mut self, limit: Limit) {
        while let Some(kb) = self.key_b() {
            let proceed = match self.key_a() {
                None => true,
                Some(ka) => match limit {
                    Limit::Excluding => kb < ka,
                    Limit::Including => kb <= ka,
                },
            };
            if !proceed {
                break;
            }
            self.b.advance();
        }
    }

    /// Set semantics: while both keys are equal, consume the *whole run*
    /// of duplicates on each side, copying second's run and skipping
    /// first's (§4.8's "process one full run of matching keys").
    fn copy_common_from_second(&mut self) {
        while let (Some(ka), Some(kb)) = (self.key_a().cloned(), self.key_b().cloned()) {
            if ka != kb {
                break;
            }
            if self.link_aligned_leaf() {
                continue;
            }
            let key = ka.clone();
            while self.key_a() == Some(&key) {
                self.a.advance();
            }
            while self.key_b() == Some(&key) {
                let elem = self.b.current().unwrap().clone();
                self.builder.append(elem);
                self.b.advance();
            }
        }
    }

    /// Set semantics: skip the whole run of duplicates on both sides
    /// whenever the keys align.
    fn skip_common(&mut self) {
        while let (Some(ka), Some(kb)) = (self.key_a().cloned(), self.key_b().cloned()) {
            if ka != kb {
                break;
            }
            if self.skip_aligned_leaf() {
                continue;
            }
            let key = ka.clone();
            while self.key_a() == Some(&key) {
                self.a.advance();
            }
            while self.key_b() == Some(&key) {
                self.b.advance();
            }
        }
    }

    /// If both scans sit at the start of the identical (same-allocation)
    /// leaf, link it into the builder whole and skip both scans past it.
    /// Returns whether the shortcut applied.
    fn link_aligned_leaf(&mut self) -> bool {
        let Some(la) = self.a.leaf_at_focus_start() else { return false };
        let Some(lb) = self.b.leaf_at_focus_start() else { return false };
        if !Shared::ptr_eq(la, lb) {
            return false;
        }
        let leaf = lb.clone();
        self.a.advance_past_leaf();
        self.b.advance_past_leaf();
        self.builder.append_subtree(leaf);
        true
    }

    /// As `link_aligned_leaf`, but for callers that don't want the leaf's
    /// elements copied into the output at all.
    fn skip_aligned_leaf(&mut self) -> bool {
        let Some(la) = self.a.leaf_at_focus_start() else { return false };
        let Some(lb) = self.b.leaf_at_focus_start() else { return false };
        if !Shared::ptr_eq(la, lb) {
            return false;
        }
        self.a.advance_past_leaf();
        self.b.advance_past_leaf();
        true
    }

    /// Multiset semantics: advance exactly one matching pair at a time
    /// (not a whole run), copying second's element.
    fn copy_matching_number_of_common_from_second(&mut self) {
        while let (Some(ka), Some(kb)) = (self.key_a(), self.key_b()) {
            if ka != kb {
                break;
            }
            let elem = self.b.current().unwrap().clone();
            self.builder.append(elem);
            self.a.advance();
            self.b.advance();
        }
    }

    /// Multiset semantics: advance exactly one matching pair at a time.
    fn skip_matching_number_of_common(&mut self) {
        while let (Some(ka), Some(kb)) = (self.key_a(), self.key_b()) {
            if ka != kb {
                break;
            }
            self.a.advance();
            self.b.advance();
        }
    }

    fn append_first(&mut self) {
        while let Some(elem) = self.a.current().cloned() {
            self.builder.append(elem);
            self.a.advance();
        }
    }

    fn append_second(&mut self) {
        while let Some(elem) = self.b.current().cloned() {
            self.builder.append(elem);
            self.b.advance();
        }
    }

    fn append_both(&mut self) {
        self.append_first();
        self.append_second();
    }

    fn finish(self) -> Shared<K, V> {
        self.builder.finish()
    }
}

impl<K: Ord + Clone, V: Clone> Tree<K, V> {
    fn same_order_as(&self, other: &Tree<K, V>) {
        assert_eq!(self.order.get(), other.order.get(), "set algebra requires matching order");
    }

    /// Multiset union: every element of both trees, duplicates kept,
    /// merged by key with `self`'s elements preceding `other`'s at equal
    /// keys.
    pub fn union(&self, other: &Tree<K, V>) -> Tree<K, V> {
        self.same_order_as(other);
        let mut m = Merger::new(self.order, self.root.clone(), other.root.clone());
        while !m.either_exhausted() {
            m.copy_from_first(Limit::Including);
            m.copy_from_second(Limit::Excluding);
        }
        m.append_both();
        Tree { root: m.finish(), order: self.order, generation: 0 }
    }

    /// Set union: at equal keys, `other`'s elements replace `self`'s.
    pub fn distinct_union(&self, other: &Tree<K, V>) -> Tree<K, V> {
        self.same_order_as(other);
        let mut m = Merger::new(self.order, self.root.clone(), other.root.clone());
        while !m.either_exhausted() {
            m.copy_from_first(Limit::Excluding);
            m.copy_from_second(Limit::Excluding);
            m.copy_common_from_second();
        }
        m.append_both();
        Tree { root: m.finish(), order: self.order, generation: 0 }
    }

    /// Set difference: elements of `self` whose key does not appear in
    /// `other`.
    pub fn subtracting(&self, other: &Tree<K, V>) -> Tree<K, V> {
        self.same_order_as(other);
        let mut m = Merger::new(self.order, self.root.clone(), other.root.clone());
        while !m.either_exhausted() {
            m.copy_from_first(Limit::Excluding);
            m.skip_from_second(Limit::Excluding);
            m.skip_common();
        }
        m.append_first();
        Tree { root: m.finish(), order: self.order, generation: 0 }
    }

    /// Multiset difference: for each key, keep `count_self - count_other`
    /// (clamped to zero) of `self`'s elements.
    pub fn bag_subtracting(&self, other: &Tree<K, V>) -> Tree<K, V> {
        self.same_order_as(other);
        let mut m = Merger::new(self.order, self.root.clone(), other.root.clone());
        while !m.either_exhausted() {
            m.copy_from_first(Limit::Excluding);
            m.skip_from_second(Limit::Excluding);
            m.skip_matching_number_of_common();
        }
        m.append_first();
        Tree { root: m.finish(), order: self.order, generation: 0 }
    }

    /// Set symmetric difference: elements whose key appears in exactly
    /// one of the two trees.
    pub fn symmetric_difference(&self, other: &Tree<K, V>) -> Tree<K, V> {
        self.same_order_as(other);
        let mut m = Merger::new(self.order, self.root.clone(), other.root.clone());
        while !m.either_exhausted() {
            m.copy_from_first(Limit::Excluding);
            m.copy_from_second(Limit::Excluding);
            m.skip_common();
        }
        m.append_both();
        Tree { root: m.finish(), order: self.order, generation: 0 }
    }

    /// Multiset symmetric difference.
    pub fn bag_symmetric_difference(&self, other: &Tree<K, V>) -> Tree<K, V> {
        self.same_order_as(other);
        let mut m = Merger::new(self.order, self.root.clone(), other.root.clone());
        while !m.either_exhausted() {
            m.copy_from_first(Limit::Excluding);
            m.copy_from_second(Limit::Excluding);
            m.skip_matching_number_of_common();
        }
        m.append_both();
        Tree { root: m.finish(), order: self.order, generation: 0 }
    }

    /// Set intersection: one copy (from `other`) of every key present in
    /// both trees.
    pub fn intersection(&self, other: &Tree<K, V>) -> Tree<K, V> {
        self.same_order_as(other);
        let mut m = Merger::new(self.order, self.root.clone(), other.root.clone());
        while !m.either_exhausted() {
            m.skip_from_first(Limit::Excluding);
            m.skip_from_second(Limit::Excluding);
            m.copy_common_from_second();
        }
        Tree { root: m.finish(), order: self.order, generation: 0 }
    }

    /// Multiset intersection: `min(count_self, count_other)` copies (from
    /// `other`) of each common key.
    pub fn bag_intersection(&self, other: &Tree<K, V>) -> Tree<K, V> {
        self.same_order_as(other);
        let mut m = Merger::new(self.order, self.root.clone(), other.root.clone());
        while !m.either_exhausted() {
            m.skip_from_first(Limit::Excluding);
            m.skip_from_second(Limit::Excluding);
            m.copy_matching_number_of_common_from_second();
        }
        Tree { root: m.finish(), order: self.order, generation: 0 }
    }

    /// Set difference against a sorted sequence of keys, in
    /// `O(|keys| · log n)`.
    pub fn subtracting_keys<I: IntoIterator<Item = K>>(&self, keys: I) -> Tree<K, V> {
        let mut path = StrongPath::seek_offset(self.root.clone(), 0);
        let mut builder = Builder::new(self.order, 1.0);
        let mut keys = keys.into_iter().peekable();
        let mut last_key: Option<K> = None;
        while let Some((k, _)) = path.current() {
            if let Some(next) = &last_key {
                assert!(*next <= *k, "tree is not sorted");
            }
            while keys.peek().is_some_and(|x| x < k) {
                keys.next();
            }
            let skip = keys.peek() == Some(k);
            if !skip {
                builder.append(path.current().unwrap().clone());
            }
            last_key = Some(k.clone());
            path.advance();
        }
        Tree { root: builder.finish(), order: self.order, generation: 0 }
    }

    /// Whether no key in `self` also appears in `other`.
    pub fn disjoint(&self, other: &Tree<K, V>) -> bool {
        self.same_order_as(other);
        self.intersection(other).is_empty()
    }

    /// Whether every key in `self`, with multiplicity, also occurs in
    /// `other` at least as many times.
    pub fn subset(&self, other: &Tree<K, V>) -> bool {
        self.same_order_as(other);
        self.bag_subtracting(other).is_empty()
    }

    /// `subset` plus `other` has at least one key `self` doesn't (by count).
    pub fn strict_subset(&self, other: &Tree<K, V>) -> bool {
        self.subset(other) && self.count() < other.count()
    }

    /// Whether every key in `other`, with multiplicity, also occurs in
    /// `self` at least as many times.
    pub fn superset(&self, other: &Tree<K, V>) -> bool {
        other.subset(self)
    }

    /// `superset` plus `self` has at least one key `other` doesn't (by count).
    pub fn strict_superset(&self, other: &Tree<K, V>) -> bool {
        other.strict_subset(self)
    }

    /// Set intersection against a sorted sequence of keys, in
    /// `O(|keys| · log n)`.
    pub fn intersecting_keys<I: IntoIterator<Item = K>>(&self, keys: I) -> Tree<K, V> {
        let mut path = StrongPath::seek_offset(self.root.clone(), 0);
        let mut builder = Builder::new(self.order, 1.0);
        let mut keys = keys.into_iter().peekable();
        while let Some((k, _)) = path.current() {
            while keys.peek().is_some_and(|x| x < k) {
                keys.next();
            }
            if keys.peek() == Some(k) {
                builder.append(path.current().unwrap().clone());
            }
            path.advance();
        }
        Tree { root: builder.finish(), order: self.order, generation: 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::Order;

    fn tree_of(pairs: &[i32]) -> Tree<i32, i32> {
        Tree::from_sorted(pairs.iter().map(|&k| (k, k)), Order::new(4), 1.0)
    }

    fn keys(t: &Tree<i32, i32>) -> Vec<i32> {
        t.iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn union_keeps_all_duplicates() {
        let a = tree_of(&[1, 2, 2, 3]);
        let b = tree_of(&[2, 4]);
        assert_eq!(keys(&a.union(&b)), vec![1, 2, 2, 2, 3, 4]);
    }

    #[test]
    fn distinct_union_lets_second_win_on_overlap() {
        let a = tree_of(&[1, 2, 3]);
        let b = tree_of(&[2, 4]);
        assert_eq!(keys(&a.distinct_union(&b)), vec![1, 2, 3, 4]);
    }

    #[test]
    fn subtracting_removes_any_overlap_key() {
        let a = tree_of(&[1, 2, 2, 3]);
        let b = tree_of(&[2]);
        assert_eq!(keys(&a.subtracting(&b)), vec![1, 3]);
    }

    #[test]
    fn bag_subtracting_removes_matched_count_only() {
        let a = tree_of(&[1, 2, 2, 2, 3]);
        let b = tree_of(&[2, 2]);
        assert_eq!(keys(&a.bag_subtracting(&b)), vec![1, 2, 3]);
    }

    #[test]
    fn intersection_is_one_copy_per_shared_key() {
        let a = tree_of(&[1, 2, 2, 3]);
        let b = tree_of(&[2, 2, 2, 4]);
        assert_eq!(keys(&a.intersection(&b)), vec![2]);
    }

    #[test]
    fn bag_intersection_takes_the_minimum_count() {
        let a = tree_of(&[2, 2, 2, 3]);
        let b = tree_of(&[2, 2, 4]);
        assert_eq!(keys(&a.bag_intersection(&b)), vec![2, 2]);
    }

    #[test]
    fn symmetric_difference_drops_only_shared_keys() {
        let a = tree_of(&[1, 2, 3]);
        let b = tree_of(&[2, 4]);
        assert_eq!(keys(&a.symmetric_difference(&b)), vec![1, 3, 4]);
    }

    #[test]
    fn intersecting_keys_filters_against_sorted_sequence() {
        let a = tree_of(&[1, 2, 3, 4, 5]);
        assert_eq!(keys(&a.intersecting_keys(vec![2, 4, 6])), vec![2, 4]);
    }

    #[test]
    fn subtracting_keys_filters_against_sorted_sequence() {
        let a = tree_of(&[1, 2, 3, 4, 5]);
        assert_eq!(keys(&a.subtracting_keys(vec![2, 4])), vec![1, 3, 5]);
    }

    #[test]
    fn disjoint_trees_share_no_key() {
        let a = tree_of(&[1, 2, 3]);
        let b = tree_of(&[4, 5]);
        assert!(a.disjoint(&b));
        assert!(b.disjoint(&a));
        let c = tree_of(&[3, 4]);
        assert!(!a.disjoint(&c));
    }

    #[test]
    fn subset_and_superset_respect_multiplicity() {
        let whole = tree_of(&[1, 2, 2, 3]);
        let part = tree_of(&[2, 3]);
        assert!(part.subset(&whole));
        assert!(whole.superset(&part));
        assert!(part.strict_subset(&whole));
        assert!(whole.strict_superset(&part));

        let too_many = tree_of(&[2, 2, 2]);
        assert!(!too_many.subset(&whole));

        assert!(whole.subset(&whole));
        assert!(!whole.strict_subset(&whole));
    }
}
