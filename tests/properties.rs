//! Property and end-to-end tests driven entirely through the public façade.

use cowtree::{Order, Selector, Tree};
use proptest::prelude::*;

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn collect<K: Clone, V: Clone>(t: &Tree<K, V>) -> Vec<(K, V)> {
    t.iter().cloned().collect()
}

// --- P2/P3: offset addressing and iteration order agree -------------------

proptest! {
    #[test]
    fn element_at_offset_matches_in_order_iteration(mut keys in prop::collection::vec(-200i32..200, 0..200)) {
        init();
        keys.sort();
        let t = Tree::from_sorted(keys.iter().map(|&k| (k, k)), Order::new(5), 1.0);
        let via_iter: Vec<_> = collect(&t);
        for (i, expected) in via_iter.iter().enumerate() {
            prop_assert_eq!(t.element_at_offset(i), Some(expected));
        }
        prop_assert_eq!(t.element_at_offset(via_iter.len()), None);
    }

    #[test]
    fn offset_of_index_round_trips_through_index_of_offset(mut keys in prop::collection::vec(-200i32..200, 1..200)) {
        init();
        keys.sort();
        let t = Tree::from_sorted(keys.iter().map(|&k| (k, k)), Order::new(4), 1.0);
        for o in 0..t.count() {
            let idx = t.index_of_offset(o);
            prop_assert_eq!(t.offset_of_index(&idx), o);
        }
    }

    #[test]
    fn iteration_is_non_decreasing_by_key(mut keys in prop::collection::vec(-100i32..100, 0..300)) {
        init();
        keys.sort();
        let t = Tree::from_sorted(keys.into_iter().map(|k| (k, ())), Order::new(6), 0.75);
        let ks: Vec<_> = t.iter().map(|(k, _)| *k).collect();
        for w in ks.windows(2) {
            prop_assert!(w[0] <= w[1]);
        }
    }
}

// --- P4: find under a selector resolves duplicates correctly --------------

proptest! {
    #[test]
    fn selector_first_and_last_bracket_all_matches_of_a_key(
        mut keys in prop::collection::vec(0i32..20, 1..150),
        target in 0i32..20,
    ) {
        init();
        keys.sort();
        let t = Tree::from_sorted(keys.iter().enumerate().map(|(i, &k)| (k, i)), Order::new(4), 1.0);
        let present = keys.iter().any(|&k| k == target);
        match t.offset_of(&target, Selector::First) {
            Some(o) => {
                prop_assert!(present);
                prop_assert_eq!(t.element_at_offset(o).unwrap().0, target);
                prop_assert!(o == 0 || t.element_at_offset(o - 1).unwrap().0 < target);
            }
            None => prop_assert!(!present),
        }
        match t.offset_of(&target, Selector::Last) {
            Some(o) => {
                prop_assert!(present);
                prop_assert_eq!(t.element_at_offset(o).unwrap().0, target);
                prop_assert!(o + 1 == t.count() || t.element_at_offset(o + 1).unwrap().0 > target);
            }
            None => prop_assert!(!present),
        }
    }
}

// --- P5: cloning a tree and mutating the clone never disturbs the original

proptest! {
    #[test]
    fn cloning_and_mutating_a_clone_leaves_the_original_untouched(
        mut keys in prop::collection::vec(0i32..500, 0..200),
        extra in 0i32..500,
    ) {
        init();
        keys.sort();
        let before = Tree::from_sorted(keys.iter().map(|&k| (k, k)), Order::new(5), 1.0);
        let mut clone = before.clone();
        let original_snapshot = collect(&before);
        clone.insert((extra, extra), Selector::Last);
        prop_assert_eq!(collect(&before), original_snapshot);
        prop_assert!(clone.count() == before.count() + 1);
    }
}

// --- P6: split/join round-trips through prefix/suffix/join -----------------

proptest! {
    #[test]
    fn prefix_and_suffix_around_an_offset_reassemble_the_tree(
        mut keys in prop::collection::vec(0i32..1000, 1..300),
    ) {
        init();
        keys.sort();
        let t = Tree::from_sorted(keys.iter().map(|&k| (k, k)), Order::new(7), 1.0);
        let o = keys.len() / 2;
        let left = t.prefix(o);
        let right = t.suffix(t.count() - o - 1);
        let middle = t.element_at_offset(o).cloned().unwrap();
        let left_count = left.count();
        let (joined, _) = left.with_cursor_at_offset(left_count, |cursor| {
            cursor.insert(middle);
            cursor.advance();
            cursor.insert_tree(right);
        });
        prop_assert!(joined.elements_equal(&t));
    }
}

// --- P7: bulk load preserves order/count and respects the depth bound ------

proptest! {
    #[test]
    fn bulk_load_respects_depth_bound(mut keys in prop::collection::vec(0i32..2000, 0..600)) {
        init();
        keys.sort();
        let order = Order::new(5);
        let t = Tree::from_sorted(keys.iter().map(|&k| (k, k)), order, 1.0);
        prop_assert_eq!(t.count(), keys.len());
        prop_assert_eq!(t.iter().map(|(k, _)| *k).collect::<Vec<_>>(), keys);
        if t.count() > 0 {
            let min_children = order.min_children() as f64;
            let bound = (t.count() as f64).log(min_children).ceil() as u32 + 1;
            prop_assert!(t.depth() <= bound);
        }
    }
}

// --- P8/P9/P10: set algebra cardinalities ----------------------------------

proptest! {
    #[test]
    fn union_preserves_total_count_and_order(
        mut a in prop::collection::vec(0i32..50, 0..100),
        mut b in prop::collection::vec(0i32..50, 0..100),
    ) {
        init();
        a.sort();
        b.sort();
        let ta = Tree::from_sorted(a.iter().map(|&k| (k, 0u8)), Order::new(4), 1.0);
        let tb = Tree::from_sorted(b.iter().map(|&k| (k, 1u8)), Order::new(4), 1.0);
        let u = ta.union(&tb);
        prop_assert_eq!(u.count(), a.len() + b.len());
        let ks: Vec<_> = u.iter().map(|(k, _)| *k).collect();
        for w in ks.windows(2) {
            prop_assert!(w[0] <= w[1]);
        }
    }

    #[test]
    fn intersection_count_never_exceeds_the_smaller_input(
        mut a in prop::collection::vec(0i32..50, 0..100),
        mut b in prop::collection::vec(0i32..50, 0..100),
    ) {
        init();
        a.sort();
        b.sort();
        let ta = Tree::from_sorted(a.iter().map(|&k| (k, ())), Order::new(4), 1.0);
        let tb = Tree::from_sorted(b.iter().map(|&k| (k, ())), Order::new(4), 1.0);
        let i = ta.intersection(&tb);
        prop_assert!(i.count() <= a.len().min(b.len()));
    }

    #[test]
    fn subtracting_and_intersection_partition_distinct_key_sets(
        mut a in prop::collection::hash_set(0i32..60, 0..60),
        mut b in prop::collection::hash_set(0i32..60, 0..60),
    ) {
        init();
        let mut a: Vec<_> = a.drain().collect();
        let mut b: Vec<_> = b.drain().collect();
        a.sort();
        b.sort();
        let ta = Tree::from_sorted(a.iter().map(|&k| (k, ())), Order::new(4), 1.0);
        let tb = Tree::from_sorted(b.iter().map(|&k| (k, ())), Order::new(4), 1.0);
        let diff = ta.subtracting(&tb);
        let common = ta.intersection(&tb);
        prop_assert_eq!(diff.count() + common.count(), a.len());
    }
}

// --- P11: comparison short-circuits on a shared root -----------------------

#[test]
fn elements_equal_detects_a_single_appended_difference() {
    init();
    let a = Tree::from_sorted((0..500).map(|i| (i, i)), Order::new(6), 1.0);
    let mut b = a.clone();
    b.insert((10_000, 10_000), Selector::Last);
    assert!(!a.elements_equal(&b));
}

// --- P12: cursor-driven mutation matches the equivalent top-level calls ----

proptest! {
    #[test]
    fn cursor_insert_matches_top_level_insert(
        mut keys in prop::collection::vec(0i32..200, 1..150),
        new_key in 0i32..200,
    ) {
        init();
        keys.sort();
        let base = Tree::from_sorted(keys.iter().map(|&k| (k, k)), Order::new(4), 1.0);

        let mut via_top_level = base.clone();
        via_top_level.insert((new_key, new_key), Selector::Last);

        let (via_cursor, _) = base.with_cursor_at_key(&new_key, Selector::Last, |cursor| {
            cursor.insert((new_key, new_key));
        });

        prop_assert!(via_top_level.elements_equal(&via_cursor));
    }
}

// --- Concrete end-to-end scenarios -----------------------------------------

#[test]
fn inserting_three_elements_out_of_order_yields_ascending_iteration() {
    init();
    let mut t = Tree::new(Order::new(4));
    t.insert((3, 3), Selector::Any);
    t.insert((1, 1), Selector::Any);
    t.insert((2, 2), Selector::Any);
    assert_eq!(collect(&t), vec![(1, 1), (2, 2), (3, 3)]);
    assert_eq!(t.count(), 3);
    assert_eq!(t.depth(), 0);
}

#[test]
fn bulk_loading_a_long_sorted_run_preserves_order_and_count() {
    init();
    let elems: Vec<(i32, i32)> = (1..=100).map(|i| (i, i)).collect();
    let t = Tree::from_sorted(elems.clone(), Order::new(4), 1.0);
    assert_eq!(t.count(), 100);
    assert_eq!(collect(&t), elems);
    // Order 4 gives maxKeys = 3, minKeys = 2; the P7 depth bound with
    // minChildren = 3 is ceil(log_3(100)) + 1 = 6.
    assert!(t.depth() <= 6);
}

#[test]
fn removing_first_or_last_duplicate_leaves_the_others_in_place() {
    init();
    let base = [(1, "a"), (1, "b"), (1, "c"), (2, "d")];

    let mut first = Tree::from_sorted(base, Order::new(4), 1.0);
    let removed = first.remove(&1, Selector::First);
    assert_eq!(removed, Some((1, "a")));
    assert_eq!(collect(&first), vec![(1, "b"), (1, "c"), (2, "d")]);

    let mut last = Tree::from_sorted(base, Order::new(4), 1.0);
    let removed = last.remove(&1, Selector::Last);
    assert_eq!(removed, Some((1, "c")));
    assert_eq!(collect(&last), vec![(1, "a"), (1, "b"), (2, "d")]);
}

#[test]
fn cloning_before_an_insert_keeps_the_clone_independent() {
    init();
    let t1 = Tree::from_sorted((1..=10).map(|i| (i, i)), Order::new(4), 1.0);
    let mut t2 = t1.clone();
    t2.insert((11, 11), Selector::Last);
    assert_eq!(collect(&t1), (1..=10).map(|i| (i, i)).collect::<Vec<_>>());
    assert_eq!(collect(&t2), (1..=11).map(|i| (i, i)).collect::<Vec<_>>());
    assert!(!t1.elements_equal(&t2));
}

#[test]
fn the_five_core_set_operations_match_their_textbook_definitions() {
    init();
    let a = Tree::from_sorted([1, 2, 3].map(|k| (k, ())), Order::new(4), 1.0);
    let b = Tree::from_sorted([2, 3, 4].map(|k| (k, ())), Order::new(4), 1.0);

    let union = a.union(&b);
    assert_eq!(union.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![1, 2, 2, 3, 3, 4]);

    let distinct_union = a.distinct_union(&b);
    assert_eq!(distinct_union.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![1, 2, 3, 4]);

    let intersection = a.intersection(&b);
    assert_eq!(intersection.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![2, 3]);

    let subtracting = a.subtracting(&b);
    assert_eq!(subtracting.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![1]);

    let symmetric_difference = a.symmetric_difference(&b);
    assert_eq!(symmetric_difference.iter().map(|(k, _)| *k).collect::<Vec<_>>(), vec![1, 4]);
}

#[test]
fn subtree_extraction_honors_exclusive_and_inclusive_upper_bounds() {
    init();
    let t = Tree::from_sorted((1..=100).map(|i| (i, i)), Order::new(4), 1.0);

    let exclusive = t.subtree(10, 20);
    assert_eq!(exclusive.count(), 10);
    assert_eq!(collect(&exclusive), (11..=20).map(|i| (i, i)).collect::<Vec<_>>());

    let inclusive = t.subtree(10, 21);
    assert_eq!(inclusive.count(), 11);
    assert_eq!(collect(&inclusive), (11..=21).map(|i| (i, i)).collect::<Vec<_>>());
}
