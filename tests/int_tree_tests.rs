//! Unit tests for IntTree.

use rstest::rstest;
use swaptree::tree::IntTree;

// =============================================================================
// Construction
// =============================================================================

#[rstest]
fn test_empty_tree_has_no_entries() {
    let tree: IntTree<String> = IntTree::empty();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.height(), 0);
    assert_eq!(tree.iter().count(), 0);
}

#[rstest]
fn test_empty_trees_are_the_same_version() {
    let first: IntTree<i32> = IntTree::empty();
    let second: IntTree<i32> = IntTree::default();
    assert!(first.ptr_eq(&second));
}

// =============================================================================
// AddOrUpdate and Lookup
// =============================================================================

#[rstest]
fn test_insert_then_replace_example() {
    let tree = IntTree::empty().add_or_update(5, Some("a"));
    assert_eq!(tree.get_or_default(5, &None), &Some("a"));
    assert_eq!(tree.get_or_default(6, &None), &None);

    let replaced = tree.add_or_update(5, Some("b"));
    assert_eq!(replaced.get_or_default(5, &None), &Some("b"));

    let entries: Vec<(i32, &Option<&str>)> = replaced.iter().collect();
    assert_eq!(entries, vec![(5, &Some("b"))]);
}

#[rstest]
fn test_try_get_distinguishes_default_value_from_absence() {
    let tree = IntTree::empty().add_or_update(1, 0);
    assert_eq!(tree.try_get(1), Some(&0));
    assert_eq!(tree.try_get(2), None);
    assert_eq!(tree.get_or_default(2, &0), &0);
}

#[rstest]
#[case::minimum(i32::MIN)]
#[case::negative(-1)]
#[case::zero(0)]
#[case::positive(1)]
#[case::maximum(i32::MAX)]
fn test_extreme_keys_need_no_special_case(#[case] key: i32) {
    let tree: IntTree<i32> = [i32::MIN, -1, 0, 1, i32::MAX]
        .into_iter()
        .map(|key| (key, key))
        .collect();

    assert_eq!(tree.try_get(key), Some(&key));
    assert_eq!(tree.check_invariants(), Ok(()));
}

#[rstest]
fn test_extreme_keys_enumerate_in_order() {
    let tree: IntTree<()> = [i32::MAX, 0, i32::MIN, 1, -1]
        .into_iter()
        .map(|key| (key, ()))
        .collect();
    let keys: Vec<i32> = tree.iter().map(|(key, _)| key).collect();
    assert_eq!(keys, vec![i32::MIN, -1, 0, 1, i32::MAX]);
}

#[rstest]
fn test_add_does_not_mutate_original() {
    let original: IntTree<&str> = IntTree::empty().add_or_update(1, "one");
    let extended = original.add_or_update(2, "two");
    let replaced = original.add_or_update(1, "ONE");

    assert_eq!(original.len(), 1);
    assert_eq!(original.try_get(1), Some(&"one"));
    assert_eq!(original.try_get(2), None);

    assert_eq!(extended.len(), 2);
    assert_eq!(replaced.try_get(1), Some(&"ONE"));
}

#[rstest]
fn test_duplicate_update_keeps_height_and_count() {
    let tree: IntTree<i32> = (0..100).map(|key| (key, key)).collect();
    let replaced = tree.add_or_update(50, -50);

    assert_eq!(replaced.len(), tree.len());
    assert_eq!(replaced.height(), tree.height());
    assert_eq!(replaced.iter().count(), 100);
    assert_eq!(replaced.try_get(50), Some(&-50));
}

#[rstest]
fn test_add_or_update_with_sees_existing_value() {
    let counter = IntTree::empty().add_or_update(0, 1);
    let incremented = counter.add_or_update_with(0, |current| current.copied().unwrap_or(0) + 1);
    assert_eq!(incremented.try_get(0), Some(&2));
    assert_eq!(incremented.len(), 1);
}

// =============================================================================
// Update (replace only)
// =============================================================================

#[rstest]
fn test_update_replaces_present_key() {
    let tree = IntTree::empty().add_or_update(1, "one").add_or_update(2, "two");
    let updated = tree.update(2, "TWO");
    assert_eq!(updated.try_get(2), Some(&"TWO"));
    assert_eq!(updated.len(), 2);
    assert_eq!(tree.try_get(2), Some(&"two"));
}

#[rstest]
fn test_update_is_no_op_for_absent_key() {
    let tree = IntTree::empty().add_or_update(1, "one");
    let untouched = tree.update(3, "three");
    assert!(untouched.ptr_eq(&tree));
    assert_eq!(untouched.len(), 1);
    assert_eq!(untouched.try_get(3), None);
}

#[rstest]
fn test_update_on_empty_tree_stays_empty() {
    let tree: IntTree<i32> = IntTree::empty();
    assert!(tree.update(0, 0).is_empty());
}

// =============================================================================
// Balancing
// =============================================================================

#[rstest]
fn test_height_bound_at_every_step() {
    let mut tree = IntTree::empty();
    for key in [20, 10, 30, 5, 15, 25, 35] {
        tree = tree.add_or_update(key, key.to_string());
        assert!(tree.height() <= 5, "height {} after {key}", tree.height());
        assert_eq!(tree.check_invariants(), Ok(()));
    }
    assert_eq!(tree.height(), 3);
}

#[rstest]
#[case::ascending((0..500).collect::<Vec<i32>>())]
#[case::descending((0..500).rev().collect::<Vec<i32>>())]
#[case::zigzag((0..250).flat_map(|key| [key, 499 - key]).collect::<Vec<i32>>())]
fn test_adversarial_orders_stay_balanced(#[case] keys: Vec<i32>) {
    let mut tree = IntTree::empty();
    for &key in &keys {
        tree = tree.add_or_update(key, ());
    }

    assert_eq!(tree.check_invariants(), Ok(()));
    assert_eq!(tree.len(), 500);
    // 1.44 * log2(502) is just under 13
    assert!(tree.height() <= 13);
}

// =============================================================================
// Enumeration
// =============================================================================

#[rstest]
fn test_enumeration_is_restartable() {
    let tree: IntTree<i32> = [3, 1, 2].into_iter().map(|key| (key, key * 10)).collect();
    let first: Vec<(i32, i32)> = tree.iter().map(|(key, value)| (key, *value)).collect();
    let second: Vec<(i32, i32)> = tree.iter().map(|(key, value)| (key, *value)).collect();
    assert_eq!(first, vec![(1, 10), (2, 20), (3, 30)]);
    assert_eq!(first, second);
}

#[rstest]
fn test_enumeration_ignores_later_versions() {
    let tree: IntTree<i32> = (0..10).map(|key| (key, key)).collect();
    let mut iterator = tree.iter();
    let _newer = tree.add_or_update(100, 100).add_or_update(0, -1);

    assert_eq!(iterator.next(), Some((0, &0)));
    assert_eq!(iterator.count(), 9);
}

#[rstest]
fn test_owned_enumeration_yields_clones() {
    let tree: IntTree<String> = (0..3).map(|key| (key, format!("v{key}"))).collect();
    let owned: Vec<(i32, String)> = tree.clone().into_iter().collect();
    assert_eq!(owned.len(), 3);
    assert_eq!(owned[2], (2, "v2".to_string()));
    assert_eq!(tree.len(), 3);
}

#[rstest]
fn test_extend_adds_entries() {
    let mut tree = IntTree::empty().add_or_update(0, 'a');
    tree.extend([(1, 'b'), (0, 'z')]);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree.try_get(0), Some(&'z'));
}

#[rstest]
fn test_equality_is_structural() {
    let forward: IntTree<i32> = (0..20).map(|key| (key, key)).collect();
    let backward: IntTree<i32> = (0..20).rev().map(|key| (key, key)).collect();
    assert_eq!(forward, backward);
    assert_ne!(forward, forward.add_or_update(0, 1));
}
