//! Externally held positions that outlive the operation that produced
//! them, and must detect — rather than silently misbehave on — a tree that
//! has since mutated out from under them.

use crate::shared::{Shared, WeakShared};
use crate::tree::Tree;

/// A position into a [`Tree`], held independently of any particular call.
///
/// Staleness can't be detected from root identity alone: `Tree`'s
/// copy-on-write path (`Arc::make_mut` via [`Shared::make_unique`]) only
/// clones a node when it is *shared*; mutating a tree with no outstanding
/// clone reuses the same allocation in place, so the root pointer an
/// `Index` remembers can still compare equal after the tree it was taken
/// from has changed underneath it. An `Index` therefore also carries the
/// generation number `Tree` bumps on every mutating call, and is valid
/// only when both the root identity and the generation still match.
pub struct Index<K, V> {
    root: WeakShared<K, V>,
    generation: u64,
    /// Child index to descend at each level, root first; the last entry is
    /// the focused element's slot within its node.
    slots: Vec<usize>,
    offset: usize,
}

impl<K, V> Index<K, V> {
    pub(crate) fn new(root: &Shared<K, V>, generation: u64, slots: Vec<usize>, offset: usize) -> Self {
        Index {
            root: Shared::downgrade(root),
            generation,
            slots,
            offset,
        }
    }

    /// Whether this index still refers to a live position in `tree`: its
    /// root must be the same allocation *and* `tree` must not have mutated
    /// since this index was taken.
    pub fn is_valid_for(&self, tree: &Tree<K, V>) -> bool {
        self.root.points_at(&tree.root) && self.generation == tree.generation
    }

    /// The absolute offset this index referred to at creation time.
    ///
    /// Panics if `tree` is not at the exact generation the index was
    /// created against — comparing or using an index against a tree
    /// generation other than the one it came from is a programming error
    /// (see the crate's error handling policy).
    pub fn offset(&self, tree: &Tree<K, V>) -> usize {
        assert!(
            self.is_valid_for(tree),
            "index used against a tree generation other than the one it was created from"
        );
        self.offset
    }

    /// The child-index path from the root to the focused element.
    pub(crate) fn slots(&self) -> &[usize] {
        &self.slots
    }
}

impl<K, V> Clone for Index<K, V> {
    fn clone(&self) -> Self {
        Index {
            root: self.root.clone(),
            generation: self.generation,
            slots: self.slots.clone(),
            offset: self.offset,
        }
    }
}
