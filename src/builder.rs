//! Bulk construction of a balanced tree from a sorted stream in O(n)
//! (§4.7).
//!
//! Elements are grouped into perfectly loaded leaves (the *seedling*,
//! until it reaches `keysPerNode`), which are then folded into a stack of
//! *saplings* kept at strictly decreasing depth. A freshly completed
//! sapling is reconciled against the trailing one on the stack two ways:
//! if they share a depth, they merge under a new one-key parent (the
//! carry-propagation shape of incrementing a binary counter); if the new
//! one is exactly one level shallower and the trailing sapling still has
//! room for another child, it is grafted on directly instead, so a node
//! keeps gaining children for as long as it sits at the top of the stack
//! rather than being sealed at two children the moment a deeper sapling
//! needs a partner. Either way the result is re-checked against what is
//! now below it on the stack, so a cascade of merges/grafts can run in
//! one call. `finish` folds whatever saplings remain (at most one per
//! depth, so O(log n) of them) into the final tree with the same
//! `concat` primitive range extraction uses.

use crate::node::Node;
use crate::order::Order;
use crate::shared::Shared;
use crate::tree::{concat, join, pop_last};

/// Streams sorted `(K, V)` pairs (or whole pre-built subtrees) into a
/// single balanced tree.
pub struct Builder<K, V> {
    order: Order,
    keys_per_node: usize,
    seedling: Vec<(K, V)>,
    /// Saplings in stream order (earliest content first), each with a
    /// strictly smaller depth than the one after it.
    saplings: Vec<Shared<K, V>>,
    last_key: Option<K>,
}

impl<K: Ord + Clone, V: Clone> Builder<K, V> {
    /// `fill_factor` (`0.5..=1.0`) controls how many elements each built
    /// leaf holds before it is folded into the sapling stack — closer to
    /// `1.0` packs leaves fuller, closer to `0.5` leaves more headroom
    /// before the next insert forces a split.
    pub fn new(order: Order, fill_factor: f64) -> Self {
        assert!(
            (0.5..=1.0).contains(&fill_factor),
            "fill factor out of range [0.5, 1.0]: {fill_factor}"
        );
        let keys_per_node = ((fill_factor * order.max_keys() as f64).round() as usize).max(1);
        Builder {
            order,
            keys_per_node,
            seedling: Vec::with_capacity(keys_per_node),
            saplings: Vec::new(),
            last_key: None,
        }
    }

    /// Append one element. The caller guarantees elements arrive in
    /// non-decreasing key order; the only check made is that the running
    /// last key is non-decreasing (§4.7's stated precondition check).
    pub fn append(&mut self, elem: (K, V)) {
        if let Some(last) = &self.last_key {
            assert!(*last <= elem.0, "builder input is not sorted by key");
        }
        self.last_key = Some(elem.0.clone());
        self.seedling.push(elem);
        if self.seedling.len() == self.keys_per_node {
            self.flush_seedling();
        }
    }

    /// Link a whole pre-built subtree in place of scanning its elements,
    /// at O(depth of `subtree`'s root) rather than O(its element count).
    /// Used by the merger to carry over aligned shared subtrees whole.
    /// The caller guarantees every key in `subtree` is `>=` every key
    /// appended so far and `<=` every key appended afterward.
    pub fn append_subtree(&mut self, subtree: Shared<K, V>) {
        if subtree.count() == 0 {
            return;
        }
        log::trace!("builder: linking subtree of count {}", subtree.count());
        if !self.seedling.is_empty() {
            self.flush_seedling();
        }
        self.last_key = Some(rightmost_key(&subtree).clone());
        self.push_sapling(subtree);
    }

    /// Fold everything appended so far into the final tree.
    pub fn finish(mut self) -> Shared<K, V> {
        self.flush_seedling();
        let mut saplings = self.saplings.into_iter();
        let mut acc = match saplings.next() {
            Some(first) => first,
            None => Shared::new(Node::empty_leaf()),
        };
        for next in saplings {
            acc = concat(self.order, acc, next);
        }
        acc
    }

    fn flush_seedling(&mut self) {
        if self.seedling.is_empty() {
            return;
        }
        let elems = std::mem::take(&mut self.seedling);
        log::trace!("builder: flushing seedling of {} elements", elems.len());
        self.push_sapling(Shared::new(Node::leaf(elems)));
    }

    fn push_sapling(&mut self, mut new: Shared<K, V>) {
        loop {
            match self.saplings.last() {
                Some(top) if top.depth() == new.depth() => {
                    let top = self.saplings.pop().unwrap();
                    new = concat(self.order, top, new);
                }
                Some(top) if top.depth() == new.depth() + 1 && top.children().len() < self.order.max_children() => {
                    let mut top = self.saplings.pop().unwrap();
                    let expected_depth = top.depth();
                    let sep = pop_last(&mut top, self.order);
                    if top.depth() == expected_depth {
                        log::trace!("builder: grafting depth {} sapling onto depth {}", new.depth(), expected_depth);
                        Shared::make_unique(&mut top).append_right(sep, new);
                        new = top;
                    } else {
                        // Popping `top`'s last element collapsed it by a
                        // level (its rightmost spine ran out of spare
                        // elements all the way up); a plain graft no longer
                        // applies, so fall back to `join`, which handles any
                        // depth difference.
                        new = join(self.order, top, sep, new);
                    }
                }
                _ => break,
            }
        }
        self.saplings.push(new);
    }
}

fn rightmost_key<K, V>(node: &Shared<K, V>) -> &K {
    let mut n = node;
    loop {
        if n.is_leaf() {
            return &n.element_at(n.len() - 1).0;
        }
        n = n.child_at(n.children().len() - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;
    use crate::tree::Tree;

    #[test]
    fn bulk_load_preserves_order_and_count() {
        let elems: Vec<(i32, i32)> = (0..500).map(|i| (i, i * 2)).collect();
        let tree = Tree::from_sorted(elems.clone(), Order::new(8), 1.0);
        assert_eq!(tree.count(), elems.len());
        let collected: Vec<_> = tree.iter().cloned().collect();
        assert_eq!(collected, elems);
    }

    #[test]
    fn bulk_load_respects_fill_factor() {
        let elems: Vec<(i32, i32)> = (0..200).map(|i| (i, i)).collect();
        let tree = Tree::from_sorted(elems, Order::new(16), 0.5);
        assert_eq!(tree.count(), 200);
        assert!(tree.depth() >= 1);
    }

    #[test]
    fn bulk_loaded_tree_supports_point_lookup() {
        let elems: Vec<(i32, i32)> = (0..64).map(|i| (i, -i)).collect();
        let tree = Tree::from_sorted(elems, Order::new(4), 1.0);
        for i in 0..64 {
            assert_eq!(tree.payload_of(&i, Selector::Any), Some(&-i));
        }
        assert_eq!(tree.payload_of(&64, Selector::Any), None);
    }
}
