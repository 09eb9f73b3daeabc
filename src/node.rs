//! B-tree node representation and node-local operations: slot search, split,
//! splinter insertion, deficiency fix-up, and subtree-range carving.

use crate::order::Order;
use crate::selector::Selector;
use crate::shared::Shared;

/// A single B-tree node.
///
/// `elements.len()` is `e`. `children` is empty for a leaf, or has `e + 1`
/// entries for an internal node. `count` and `depth` are caches kept
/// consistent by every node-local operation (invariants I4, I5).
#[derive(Clone)]
pub struct Node<K, V> {
    elements: Vec<(K, V)>,
    children: Vec<Shared<K, V>>,
    count: usize,
    depth: u32,
}

/// Outcome of searching a node for a key under a [`Selector`].
pub struct SlotSearch {
    /// `Some(i)` if `elements[i]` matches the query under the selector.
    pub matched: Option<usize>,
    /// The child index to descend into if no (further) match is required.
    pub descend: usize,
}

impl<K, V> Node<K, V> {
    /// An empty leaf, the canonical empty tree's root.
    pub fn empty_leaf() -> Self {
        Node {
            elements: Vec::new(),
            children: Vec::new(),
            count: 0,
            depth: 0,
        }
    }

    /// Build a leaf node from its elements.
    pub fn leaf(elements: Vec<(K, V)>) -> Self {
        let count = elements.len();
        Node {
            elements,
            children: Vec::new(),
            count,
            depth: 0,
        }
    }

    /// Build an internal node from its elements and children, computing
    /// `count` and `depth` from the children.
    pub fn internal(elements: Vec<(K, V)>, children: Vec<Shared<K, V>>) -> Self {
        debug_assert_eq!(children.len(), elements.len() + 1);
        let mut n = Node {
            elements,
            children,
            count: 0,
            depth: 0,
        };
        n.recompute();
        n
    }

    /// Recompute `count` and `depth` from the current elements/children.
    /// Called after any node-local edit (I4, I5).
    pub fn recompute(&mut self) {
        if self.children.is_empty() {
            self.count = self.elements.len();
            self.depth = 0;
        } else {
            self.count = self.elements.len() + self.children.iter().map(|c| c.count()).sum::<usize>();
            self.depth = 1 + self.children[0].depth();
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of elements stored directly in this node (`e`).
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty_node(&self) -> bool {
        self.elements.is_empty() && self.children.is_empty()
    }

    /// Total number of elements in the subtree rooted here.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn elements(&self) -> &[(K, V)] {
        &self.elements
    }

    pub fn elements_mut(&mut self) -> &mut Vec<(K, V)> {
        &mut self.elements
    }

    pub fn children(&self) -> &[Shared<K, V>] {
        &self.children
    }

    pub fn children_mut(&mut self) -> &mut Vec<Shared<K, V>> {
        &mut self.children
    }

    pub fn element_at(&self, i: usize) -> &(K, V) {
        &self.elements[i]
    }

    pub fn child_at(&self, i: usize) -> &Shared<K, V> {
        &self.children[i]
    }
}

impl<K: Clone, V: Clone> Node<K, V> {
    /// Ensure `children[i]` is uniquely owned, cloning it first if it is
    /// shared with another tree, and return a mutable reference to it.
    ///
    /// Called at every level of a mutating descent so only the spine
    /// actually touched by a mutation is ever cloned (invariant-preserving
    /// copy-on-write, §4.2).
    pub fn make_child_unique(&mut self, i: usize) -> &mut Node<K, V> {
        Shared::make_unique(&mut self.children[i])
    }
}

impl<K: Ord, V> Node<K, V> {
    /// Binary search this node's elements for `key` under `selector`.
    ///
    /// See spec §4.1: `First`/`Any` return the leftmost slot whose key is
    /// `≥ query`; `Last` returns the rightmost slot whose key is `≤ query`
    /// (with `descend = match + 1`); `After` returns the leftmost slot whose
    /// key is `> query` and never matches.
    pub fn slot_of(&self, key: &K, selector: Selector) -> SlotSearch {
        match selector {
            Selector::First | Selector::Any => {
                let i = self.elements.partition_point(|(k, _)| k < key);
                let matched = if i < self.elements.len() && &self.elements[i].0 == key {
                    Some(i)
                } else {
                    None
                };
                SlotSearch { matched, descend: i }
            }
            Selector::Last => {
                let i = self.elements.partition_point(|(k, _)| k <= key);
                let matched = if i > 0 && &self.elements[i - 1].0 == key {
                    Some(i - 1)
                } else {
                    None
                };
                SlotSearch { matched, descend: i }
            }
            Selector::After => {
                let i = self.elements.partition_point(|(k, _)| k <= key);
                SlotSearch { matched: None, descend: i }
            }
        }
    }

    /// Insert position for a new element with this key, honoring duplicate
    /// placement: `leftmost = true` inserts before any existing equal key
    /// (selector `First`), `leftmost = false` inserts after (selector
    /// `Last`/`Any`).
    fn insert_slot(&self, key: &K, leftmost: bool) -> usize {
        if leftmost {
            self.elements.partition_point(|(k, _)| k < key)
        } else {
            self.elements.partition_point(|(k, _)| k <= key)
        }
    }
}

impl<K, V> Node<K, V> {
    /// Search this node for the child/element at `offset` within its own
    /// subtree. Leaves return `(offset, true, offset)` per spec §4.1.
    /// Internal nodes scan children accumulating subtree counts, returning
    /// `match = true` exactly when `offset` lands on the separator between
    /// two children.
    pub fn slot_of_offset(&self, offset: usize) -> (usize, bool, usize) {
        if self.is_leaf() {
            return (offset, true, offset);
        }
        let mut acc = 0usize;
        for (i, child) in self.children.iter().enumerate() {
            let child_count = child.count();
            if offset < acc + child_count {
                return (i, false, acc);
            }
            acc += child_count;
            if i < self.elements.len() {
                if offset == acc {
                    return (i, true, acc);
                }
                acc += 1;
            }
        }
        // offset is one past the end: descend into the last child.
        (self.children.len() - 1, false, self.count - self.children.last().unwrap().count())
    }
}

impl<K: Clone, V: Clone> Node<K, V> {
    /// Split this overflowing node. Precondition: `len() > order.max_keys()`.
    ///
    /// The median element becomes the separator; this node is truncated to
    /// the left half and the right half is returned as a new node.
    pub fn split(&mut self) -> ((K, V), Node<K, V>) {
        let e = self.elements.len();
        debug_assert!(e >= 2, "cannot split a node with fewer than 2 elements");
        let median = e / 2;
        let sep = self.elements[median].clone();

        let right_elements = self.elements.split_off(median + 1);
        self.elements.truncate(median);

        let right = if self.is_leaf() {
            Node::leaf(right_elements)
        } else {
            let right_children = self.children.split_off(median + 1);
            Node::internal(right_elements, right_children)
        };
        self.recompute();
        log::trace!("split: left e={}, right e={}", self.elements.len(), right.elements.len());
        (sep, right)
    }

    /// Build a node carrying the element slot range `range` of `source`,
    /// plus (for an internal source) the flanking children
    /// `range.start..=range.end`. Used by split's right half and by the
    /// merger's aligned-range linking.
    pub fn from_range(source: &Node<K, V>, range: std::ops::Range<usize>) -> Node<K, V> {
        let elements = source.elements[range.clone()].to_vec();
        if source.is_leaf() {
            Node::leaf(elements)
        } else {
            let children = source.children[range.start..=range.end].to_vec();
            Node::internal(elements, children)
        }
    }

    /// Insert `elem` at the given selector-determined duplicate position,
    /// without descending into children (this node must be a leaf).
    pub fn insert_leaf(&mut self, elem: (K, V), leftmost: bool)
    where
        K: Ord,
    {
        debug_assert!(self.is_leaf());
        let slot = self.insert_slot(&elem.0, leftmost);
        self.elements.insert(slot, elem);
        self.recompute();
    }

    /// Insert a separator and the right half of a split at `slot`: the
    /// separator goes to `elements[slot]`, the new child to
    /// `children[slot + 1]`.
    pub fn insert_splinter_at_slot(&mut self, slot: usize, sep: (K, V), right: Shared<K, V>) {
        self.elements.insert(slot, sep);
        self.children.insert(slot + 1, right);
        self.recompute();
    }

    /// Append `child` as the new rightmost child, with `sep` as the new
    /// rightmost separator.
    pub fn append_right(&mut self, sep: (K, V), child: Shared<K, V>) {
        self.elements.push(sep);
        self.children.push(child);
        self.recompute();
    }

    /// Prepend `child` as the new leftmost child, with `sep` as the new
    /// leftmost separator.
    pub fn prepend_left(&mut self, sep: (K, V), child: Shared<K, V>) {
        self.elements.insert(0, sep);
        self.children.insert(0, child);
        self.recompute();
    }

    /// Remove and return the element at `i` (leaf only).
    pub fn remove_leaf_element(&mut self, i: usize) -> (K, V) {
        debug_assert!(self.is_leaf());
        let e = self.elements.remove(i);
        self.recompute();
        e
    }

    /// Remove the separator at `slot` and the child at `slot + 1` (used
    /// when a child becomes fully absorbed by a collapse).
    fn remove_separator_and_right_child(&mut self, slot: usize) -> Shared<K, V> {
        self.elements.remove(slot);
        let removed = self.children.remove(slot + 1);
        self.recompute();
        removed
    }

    /// Fix a deficiency in `children[slot]` (which has fewer than
    /// `order.min_keys()` elements, but is otherwise internally balanced).
    /// Tries, in order: rotate from the left sibling, rotate from the right
    /// sibling, collapse with the left sibling, collapse with the right
    /// sibling. Returns `true` if `self` lost a child (a collapse
    /// happened), which may leave `self` itself deficient.
    pub fn fix_deficiency(&mut self, slot: usize, order: Order) -> bool
    where
        K: Ord,
    {
        let min_keys = order.min_keys();
        if slot > 0 && self.children[slot - 1].len() > min_keys {
            self.rotate_right(slot);
            return false;
        }
        if slot + 1 < self.children.len() && self.children[slot + 1].len() > min_keys {
            self.rotate_left(slot);
            return false;
        }
        if slot > 0 {
            self.collapse(slot - 1);
            true
        } else {
            self.collapse(slot);
            true
        }
    }

    /// Move the parent separator `elements[slot - 1]` down into the front of
    /// `children[slot]`, pull the left sibling's last element up into the
    /// parent, and move the sibling's last child to the front of the
    /// deficient child.
    fn rotate_right(&mut self, slot: usize) {
        let sep_idx = slot - 1;
        let left = Shared::make_unique(&mut self.children[slot - 1]);
        let moved_elem = left.elements.pop().expect("left sibling has spare element");
        let moved_child = if left.is_leaf() { None } else { left.children.pop() };
        left.recompute();

        let parent_sep = std::mem::replace(&mut self.elements[sep_idx], moved_elem);

        let deficient = Shared::make_unique(&mut self.children[slot]);
        deficient.elements.insert(0, parent_sep);
        if let Some(c) = moved_child {
            deficient.children.insert(0, c);
        }
        deficient.recompute();
        log::trace!("rotate_right at slot {slot}");
    }

    /// Symmetric to [`Self::rotate_right`]: borrow from the right sibling.
    fn rotate_left(&mut self, slot: usize) {
        let sep_idx = slot;
        let right = Shared::make_unique(&mut self.children[slot + 1]);
        let moved_elem = right.elements.remove(0);
        let moved_child = if right.is_leaf() {
            None
        } else {
            Some(right.children.remove(0))
        };
        right.recompute();

        let parent_sep = std::mem::replace(&mut self.elements[sep_idx], moved_elem);

        let deficient = Shared::make_unique(&mut self.children[slot]);
        deficient.elements.push(parent_sep);
        if let Some(c) = moved_child {
            deficient.children.push(c);
        }
        deficient.recompute();
        log::trace!("rotate_left at slot {slot}");
    }

    /// Concatenate `children[left_slot] ++ [elements[left_slot]] ++
    /// children[left_slot + 1]` into a single node occupying
    /// `children[left_slot]`, removing the separator and the right child.
    fn collapse(&mut self, left_slot: usize) {
        let sep = self.elements[left_slot].clone();
        let right = self.remove_separator_and_right_child(left_slot);
        let left = Shared::make_unique(&mut self.children[left_slot]);
        left.elements.push(sep);
        left.elements.extend(right.elements.iter().cloned());
        if !right.is_leaf() {
            left.children.extend(right.children.iter().cloned());
        }
        left.recompute();
        log::trace!("collapse at slot {left_slot}, merged e={}", left.elements.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(keys: &[i32]) -> Node<i32, i32> {
        Node::leaf(keys.iter().map(|&k| (k, k * 10)).collect())
    }

    #[test]
    fn slot_of_selectors() {
        let n = leaf(&[1, 1, 1, 3, 5]);
        let s = n.slot_of(&1, Selector::First);
        assert_eq!(s.matched, Some(0));
        let s = n.slot_of(&1, Selector::Last);
        assert_eq!(s.matched, Some(2));
        assert_eq!(s.descend, 3);
        let s = n.slot_of(&1, Selector::After);
        assert_eq!(s.matched, None);
        assert_eq!(s.descend, 3);
        let s = n.slot_of(&2, Selector::First);
        assert_eq!(s.matched, None);
        assert_eq!(s.descend, 3);
    }

    #[test]
    fn split_balances() {
        let mut n = leaf(&[1, 2, 3, 4, 5]);
        let (sep, right) = n.split();
        assert_eq!(sep.0, 3);
        assert_eq!(n.elements().iter().map(|e| e.0).collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(right.elements().iter().map(|e| e.0).collect::<Vec<_>>(), vec![4, 5]);
    }

    #[test]
    fn offset_search_on_leaf_is_identity() {
        let n = leaf(&[1, 2, 3]);
        assert_eq!(n.slot_of_offset(1), (1, true, 1));
    }
}
