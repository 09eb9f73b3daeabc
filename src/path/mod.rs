//! Shared descent-trace machinery used by the strong path (read-only
//! scans), the cursor (batched mutation) and the weak index.
//!
//! A path is a stack of [`Frame`]s from the root to a focused position.
//! Every frame but the last records "we descended into `children[slot]`";
//! the last frame's `slot` is the focused element's index *within that
//! node* — since this is a classic B-tree (not a B+-tree), the focus can
//! land on an internal node's own element, not only on a leaf.
//!
//! The empty stack (`frames.is_empty()`) is the canonical off-the-end
//! position, following the same convention `cranelift-bforest`'s `Path`
//! uses (`size == 0`).

pub mod cursor;
pub mod strong;

use crate::selector::Selector;
use crate::shared::Shared;

/// One level of a descent trace.
pub struct Frame<K, V> {
    pub node: Shared<K, V>,
    pub slot: usize,
}

// Hand-written for the same reason as `Shared`'s: cloning a frame only
// bumps the node's refcount, so this must not require `K: Clone, V: Clone`.
impl<K, V> Clone for Frame<K, V> {
    fn clone(&self) -> Self {
        Frame { node: self.node.clone(), slot: self.slot }
    }
}

/// Push frames descending via `children[0]` repeatedly until a leaf is
/// reached, focusing its first element. Used to find the minimum of a
/// subtree.
pub(crate) fn push_leftmost<K, V>(frames: &mut Vec<Frame<K, V>>, mut node: Shared<K, V>) {
    loop {
        if node.is_leaf() {
            frames.push(Frame { node, slot: 0 });
            return;
        }
        let child = node.child_at(0).clone();
        frames.push(Frame { node, slot: 0 });
        node = child;
    }
}

/// Push frames descending via the last child repeatedly until a leaf is
/// reached, focusing its last element. Used to find the maximum of a
/// subtree. Panics if the subtree is empty.
pub(crate) fn push_rightmost<K, V>(frames: &mut Vec<Frame<K, V>>, mut node: Shared<K, V>) {
    loop {
        if node.is_leaf() {
            let slot = node.len().checked_sub(1).expect("non-empty subtree");
            frames.push(Frame { node, slot });
            return;
        }
        let last = node.children().len() - 1;
        let child = node.child_at(last).clone();
        frames.push(Frame { node, slot: last });
        node = child;
    }
}

/// Seek `frames` to the position described by `key`/`selector`, starting
/// from `root`. Returns whether an element with key `== key` was found
/// (for `After`, whether any element `> key` exists).
///
/// Handles the duplicate-key subtlety described in spec §4.1/§4.9: because
/// equal keys may straddle the boundary between a node's own element and
/// either flanking child, `First`/`Last`/`After` always continue the
/// descent, remembering the most recent candidate, and only settle on it if
/// nothing better turns up deeper down. `Any` stops at the first match.
pub(crate) fn seek_key<K: Ord, V>(
    frames: &mut Vec<Frame<K, V>>,
    root: Shared<K, V>,
    key: &K,
    selector: Selector,
) -> bool {
    seek_rec(frames, root, key, selector)
}

fn seek_rec<K: Ord, V>(
    frames: &mut Vec<Frame<K, V>>,
    node: Shared<K, V>,
    key: &K,
    selector: Selector,
) -> bool {
    let search = node.slot_of(key, selector);
    match selector {
        Selector::Any => {
            if let Some(i) = search.matched {
                frames.push(Frame { node, slot: i });
                return true;
            }
            if node.is_leaf() {
                frames.push(Frame { node, slot: search.descend });
                return false;
            }
            let child = node.child_at(search.descend).clone();
            frames.push(Frame { node, slot: search.descend });
            seek_rec(frames, child, key, selector)
        }
        Selector::First => match search.matched {
            Some(i) => {
                if node.is_leaf() {
                    frames.push(Frame { node, slot: i });
                    true
                } else {
                    let mark = frames.len();
                    let child = node.child_at(i).clone();
                    frames.push(Frame { node, slot: i });
                    if !seek_rec(frames, child, key, selector) {
                        frames.truncate(mark + 1);
                    }
                    true
                }
            }
            None => {
                if node.is_leaf() {
                    frames.push(Frame { node, slot: search.descend });
                    false
                } else {
                    let child = node.child_at(search.descend).clone();
                    frames.push(Frame { node, slot: search.descend });
                    seek_rec(frames, child, key, selector)
                }
            }
        },
        Selector::Last => match search.matched {
            Some(i) => {
                if node.is_leaf() {
                    frames.push(Frame { node, slot: i });
                    true
                } else {
                    let mark = frames.len();
                    let child = node.child_at(i + 1).clone();
                    frames.push(Frame { node, slot: i });
                    if !seek_rec(frames, child, key, selector) {
                        frames.truncate(mark + 1);
                    }
                    true
                }
            }
            None => {
                if node.is_leaf() {
                    frames.push(Frame { node, slot: search.descend });
                    false
                } else {
                    let child = node.child_at(search.descend).clone();
                    frames.push(Frame { node, slot: search.descend });
                    seek_rec(frames, child, key, selector)
                }
            }
        },
        Selector::After => {
            if node.is_leaf() {
                let len = node.len();
                frames.push(Frame { node, slot: search.descend });
                search.descend < len
            } else if search.descend < node.len() {
                let mark = frames.len();
                let child = node.child_at(search.descend).clone();
                frames.push(Frame { node, slot: search.descend });
                if !seek_rec(frames, child, key, selector) {
                    frames.truncate(mark + 1);
                }
                true
            } else {
                let last = node.len();
                let child = node.child_at(last).clone();
                frames.push(Frame { node, slot: last });
                seek_rec(frames, child, key, selector)
            }
        }
    }
}

/// Find the element matching `key`/`selector` within `node`'s subtree and
/// return a reference to it directly, without building a descent trace.
///
/// Mirrors `seek_rec`'s case analysis exactly (same "remember the most
/// recent candidate, settle on it only if nothing better turns up deeper"
/// rule), but since callers here only want the focused element itself —
/// not a reusable position to advance/retreat from — there is no need to
/// materialize a `Vec<Frame>`, which lets the result borrow directly from
/// `node` instead of from a trace that would be dropped at the end of the
/// call.
pub(crate) fn current_at_key<'a, K: Ord, V>(node: &'a Shared<K, V>, key: &K, selector: Selector) -> Option<&'a (K, V)> {
    let search = node.slot_of(key, selector);
    match selector {
        Selector::Any => search.matched.map(|i| node.element_at(i)),
        Selector::First => match search.matched {
            Some(i) => {
                if node.is_leaf() {
                    Some(node.element_at(i))
                } else {
                    current_at_key(node.child_at(i), key, selector).or_else(|| Some(node.element_at(i)))
                }
            }
            None => {
                if node.is_leaf() {
                    None
                } else {
                    current_at_key(node.child_at(search.descend), key, selector)
                }
            }
        },
        Selector::Last => match search.matched {
            Some(i) => {
                if node.is_leaf() {
                    Some(node.element_at(i))
                } else {
                    current_at_key(node.child_at(i + 1), key, selector).or_else(|| Some(node.element_at(i)))
                }
            }
            None => {
                if node.is_leaf() {
                    None
                } else {
                    current_at_key(node.child_at(search.descend), key, selector)
                }
            }
        },
        Selector::After => {
            if node.is_leaf() {
                if search.descend < node.len() {
                    Some(node.element_at(search.descend))
                } else {
                    None
                }
            } else if search.descend < node.len() {
                current_at_key(node.child_at(search.descend), key, selector).or_else(|| Some(node.element_at(search.descend)))
            } else {
                current_at_key(node.child_at(node.len()), key, selector)
            }
        }
    }
}

/// Seek `frames` to the element at absolute `offset` within `root`'s
/// subtree. `offset == root.count()` positions off-the-end (empty frames).
pub(crate) fn seek_offset<K, V>(frames: &mut Vec<Frame<K, V>>, root: Shared<K, V>, offset: usize) {
    assert!(offset <= root.count(), "offset {offset} out of bounds");
    if offset == root.count() {
        frames.clear();
        return;
    }
    let mut node = root;
    let mut remaining = offset;
    loop {
        let (idx, matched, base) = node.slot_of_offset(remaining);
        if matched {
            frames.push(Frame { node, slot: idx });
            return;
        }
        let child = node.child_at(idx).clone();
        frames.push(Frame { node, slot: idx });
        remaining -= base;
        node = child;
    }
}

/// Advance `frames` to the next in-order position. Returns `false` (and
/// leaves `frames` empty) once the end is passed.
pub(crate) fn advance<K, V>(frames: &mut Vec<Frame<K, V>>) -> bool {
    let Some(top) = frames.last().cloned() else {
        return false;
    };
    if !top.node.is_leaf() {
        // Focus was an internal element; successor is the minimum of the
        // next child.
        let next_child = top.node.child_at(top.slot + 1).clone();
        frames.last_mut().unwrap().slot = top.slot + 1;
        push_leftmost(frames, next_child);
        return true;
    }
    if top.slot + 1 < top.node.len() {
        frames.last_mut().unwrap().slot += 1;
        return true;
    }
    // Leaf exhausted: pop and ascend until we find an ancestor with an
    // element immediately after the child we came from.
    frames.pop();
    while let Some(parent) = frames.last() {
        if parent.slot < parent.node.len() {
            return true; // parent's own element at `slot` is the focus now.
        }
        frames.pop();
    }
    false
}

/// Move `frames` to the previous in-order position. Returns `false` (and
/// leaves `frames` unchanged) if already at the first element.
pub(crate) fn retreat<K, V>(frames: &mut Vec<Frame<K, V>>, root: Shared<K, V>) -> bool {
    if frames.is_empty() {
        // Off-the-end: the predecessor is the maximum element.
        if root.count() == 0 {
            return false;
        }
        push_rightmost(frames, root);
        return true;
    }
    let top = frames.last().cloned().unwrap();
    if !top.node.is_leaf() {
        let prev_child = top.node.child_at(top.slot).clone();
        push_rightmost(frames, prev_child);
        return true;
    }
    if top.slot > 0 {
        frames.last_mut().unwrap().slot -= 1;
        return true;
    }
    let saved = frames.clone();
    frames.pop();
    while let Some(parent) = frames.last().cloned() {
        if parent.slot > 0 {
            // The element immediately before the child we came from is
            // `elements[slot - 1]`.
            frames.last_mut().unwrap().slot -= 1;
            return true;
        }
        frames.pop();
    }
    *frames = saved;
    false
}

/// Borrow the focused element, if any.
pub(crate) fn current<'a, K, V>(frames: &'a [Frame<K, V>]) -> Option<&'a (K, V)> {
    frames.last().map(|f| f.node.element_at(f.slot))
}

/// The absolute offset of the focused position within the whole subtree
/// the path was seeked from.
pub(crate) fn offset_of<K, V>(frames: &[Frame<K, V>]) -> usize {
    let last = frames.len() - 1;
    let mut offset = 0usize;
    for (i, f) in frames.iter().enumerate() {
        if f.node.is_leaf() {
            offset += f.slot;
        } else if i == last {
            for j in 0..=f.slot {
                offset += f.node.child_at(j).count();
            }
            offset += f.slot;
        } else {
            for j in 0..f.slot {
                offset += f.node.child_at(j).count();
            }
            offset += f.slot;
        }
    }
    offset
}
