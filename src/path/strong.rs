//! Read-only descent trace used internally by the iterator, tree
//! comparisons, and the merger. Holds a strong [`Shared`] reference to the
//! root for its whole lifetime, so (unlike the externally visible `Index`)
//! it never needs to detect staleness.

use super::{advance, current, retreat, seek_key, seek_offset, Frame};
use crate::selector::Selector;
use crate::shared::Shared;

/// A live, read-only position within a subtree.
pub struct StrongPath<K, V> {
    root: Shared<K, V>,
    frames: Vec<Frame<K, V>>,
}

impl<K, V> StrongPath<K, V> {
    /// A path positioned off-the-end of `root`'s subtree.
    pub fn past_end(root: Shared<K, V>) -> Self {
        StrongPath { root, frames: Vec::new() }
    }

    /// The current element, or `None` if positioned off-the-end.
    pub fn current(&self) -> Option<&(K, V)> {
        current(&self.frames)
    }

    /// Whether this path is positioned off-the-end.
    pub fn is_past_end(&self) -> bool {
        self.frames.is_empty()
    }

    /// Advance to the next in-order element. Returns `false` once past the
    /// end.
    pub fn advance(&mut self) -> bool {
        advance(&mut self.frames)
    }

    /// Move to the previous in-order element. Returns `false` if already at
    /// the first element (or the tree is empty).
    pub fn retreat(&mut self) -> bool {
        retreat(&mut self.frames, self.root.clone())
    }

    pub fn root(&self) -> &Shared<K, V> {
        &self.root
    }

    /// If the focus is the first element of the leaf holding it, return
    /// that leaf — so a caller scanning a second path in lockstep can test
    /// `Shared::ptr_eq` against it and, on a match, consume the whole leaf
    /// in one step instead of element by element (§4.8's aligned shared
    /// subtree shortcut). `None` past the end, or when the focus is an
    /// internal node's own element or not a leaf's first slot.
    pub fn leaf_at_focus_start(&self) -> Option<&Shared<K, V>> {
        let frame = self.frames.last()?;
        (frame.node.is_leaf() && frame.slot == 0).then_some(&frame.node)
    }

    /// Skip past the whole leaf most recently confirmed by
    /// `leaf_at_focus_start`, landing on whatever in-order element follows
    /// it (or past-the-end).
    pub fn advance_past_leaf(&mut self) {
        let len = self.frames.last().expect("positioned at a leaf").node.len();
        for _ in 0..len {
            self.advance();
        }
    }
}

impl<K: Ord, V> StrongPath<K, V> {
    /// Seek to the position described by `key`/`selector`.
    pub fn seek_key(root: Shared<K, V>, key: &K, selector: Selector) -> (Self, bool) {
        let mut frames = Vec::new();
        let found = seek_key(&mut frames, root.clone(), key, selector);
        (StrongPath { root, frames }, found)
    }
}

impl<K, V> StrongPath<K, V> {
    /// Seek to the element at absolute `offset`.
    pub fn seek_offset(root: Shared<K, V>, offset: usize) -> Self {
        let mut frames = Vec::new();
        seek_offset(&mut frames, root.clone(), offset);
        StrongPath { root, frames }
    }
}

impl<K, V> Clone for StrongPath<K, V> {
    fn clone(&self) -> Self {
        StrongPath {
            root: self.root.clone(),
            frames: self.frames.clone(),
        }
    }
}
