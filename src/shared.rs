//! The reference-counted handle over a [`Node`], and the copy-on-write
//! discipline built on top of it.

use std::sync::Arc;

use crate::node::Node;

/// A reference-counted handle to a [`Node`].
///
/// Cloning a `Shared` is O(1) — it bumps a refcount. Mutating through a
/// `Shared` first ensures the handle is the sole owner of its target,
/// cloning the node if it is not. `Arc` (rather than `Rc`) is used so that
/// read-only sharing of a `Tree` across threads is sound: two threads
/// holding clones of the same `Tree` may read concurrently, which requires
/// the refcount itself to be atomic (see §5 of the spec).
pub struct Shared<K, V>(Arc<Node<K, V>>);

// Written by hand rather than `#[derive(Clone)]`: the derive would add
// `K: Clone, V: Clone` bounds to the impl even though cloning an `Arc`
// never requires its target to be `Clone`. Read-only operations (count,
// iteration, comparison) must work for key/value types that aren't `Clone`
// at all; only the COW path in `make_unique` actually needs it.
impl<K, V> Clone for Shared<K, V> {
    fn clone(&self) -> Self {
        Shared(self.0.clone())
    }
}

impl<K, V> Shared<K, V> {
    /// Wrap a freshly built node.
    pub fn new(node: Node<K, V>) -> Self {
        Shared(Arc::new(node))
    }

    /// Two handles are the same allocation iff `Arc::ptr_eq` says so. This
    /// is the identity check the merger uses to detect aligned shared
    /// subtrees (§4.8) without comparing contents.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// A weak reference to this handle's target, for externally held
    /// indices (§4.3's weak path).
    pub fn downgrade(this: &Self) -> WeakShared<K, V> {
        WeakShared(Arc::downgrade(&this.0))
    }
}

impl<K, V> Shared<K, V>
where
    K: Clone,
    V: Clone,
{
    /// Return a mutable reference to the target node, cloning it first if
    /// this handle is not the unique owner.
    ///
    /// This is the sole mechanism that preserves value semantics at O(log
    /// n) cost per mutation: every mutating descent calls this (directly,
    /// or via [`Node::make_child_unique`]) at each step, so only the nodes
    /// on the mutated spine are ever actually cloned.
    pub fn make_unique(this: &mut Self) -> &mut Node<K, V> {
        Arc::make_mut(&mut this.0)
    }
}

impl<K, V> std::ops::Deref for Shared<K, V> {
    type Target = Node<K, V>;

    fn deref(&self) -> &Node<K, V> {
        &self.0
    }
}

/// A weak reference to a [`Node`], used by externally held indices that
/// must detect when their target has been detached from the live tree.
pub struct WeakShared<K, V>(std::sync::Weak<Node<K, V>>);

impl<K, V> Clone for WeakShared<K, V> {
    fn clone(&self) -> Self {
        WeakShared(self.0.clone())
    }
}

impl<K, V> WeakShared<K, V> {
    /// Attempt to upgrade back to a strong handle. Returns `None` once the
    /// node this weak reference pointed at has been dropped (e.g. because a
    /// mutation replaced it with a clone).
    pub fn upgrade(&self) -> Option<Shared<K, V>> {
        self.0.upgrade().map(Shared)
    }

    /// Identity comparison against a strong handle, without upgrading.
    pub fn points_at(&self, other: &Shared<K, V>) -> bool {
        self.0.as_ptr() == Arc::as_ptr(&other.0)
    }
}
