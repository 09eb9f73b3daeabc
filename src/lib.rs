//! An in-memory, ordered, copy-on-write B-tree.
//!
//! `Tree<K, V>` is a value type: cloning it is O(1) (it bumps a refcount),
//! and mutating a clone never affects any other clone. The cost of that
//! guarantee is paid only on the path actually touched by a mutation —
//! copy-on-write at the node level, not at the whole-tree level.
//!
//! Unlike a B+-tree, internal nodes hold real `(K, V)` elements, not just
//! routing keys, so duplicate keys may legally straddle the boundary
//! between a node's own element and either flanking child; every
//! duplicate-aware operation takes a [`Selector`] to resolve that.
//!
//! This crate provides the tree, its cursor for batched in-place mutation,
//! an externally held stable position ([`Index`]), and the set-algebra
//! operations built on top ([`Tree::union`] and siblings). There is no
//! file format, wire protocol, or persisted state — the tree lives only in
//! memory for the duration of the process that builds it.

mod builder;
mod index;
mod merger;
mod node;
mod order;
mod path;
mod selector;
mod shared;
mod tree;

pub mod iter;

pub use crate::index::Index;
pub use crate::order::Order;
pub use crate::path::cursor::Cursor;
pub use crate::selector::Selector;
pub use crate::tree::Tree;
