//! Strategy for resolving lookups, insertions and removals against
//! duplicate keys.

/// Controls how an operation behaves in the presence of duplicate keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Selector {
    /// The first (leftmost) element with the given key.
    First,
    /// The last (rightmost) element with the given key.
    Last,
    /// The first element whose key is strictly greater than the given key.
    /// Never matches an element equal to the query; has no "identity" slot.
    After,
    /// Any element with the given key. Semantically equivalent to `First`
    /// for lookup (the implementation may stop descending at the first
    /// internal slot that matches, which is cheaper than chasing `First`
    /// or `Last` all the way to a leaf). Insertion under `Any` behaves like
    /// `Last` (append within the run of duplicates), per §4.9.
    Any,
}
