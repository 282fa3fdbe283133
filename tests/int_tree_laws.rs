//! Property-based tests for IntTree.
//!
//! These tests verify that IntTree upholds its ordering, balance and
//! persistence guarantees for arbitrary insertion sequences.

use std::collections::BTreeMap;

use proptest::prelude::*;
use swaptree::tree::IntTree;

// =============================================================================
// Strategies for Generating Test Data
// =============================================================================

fn arbitrary_entries(max_size: usize) -> impl Strategy<Value = Vec<(i32, i32)>> {
    prop::collection::vec((any::<i32>(), any::<i32>()), 0..max_size)
}

fn build(entries: &[(i32, i32)]) -> IntTree<i32> {
    entries
        .iter()
        .fold(IntTree::empty(), |tree, &(key, value)| tree.add_or_update(key, value))
}

// =============================================================================
// Structural Invariants
// =============================================================================

proptest! {
    /// Every intermediate version satisfies order, balance and height.
    #[test]
    fn prop_every_version_is_valid(entries in arbitrary_entries(200)) {
        let mut tree = IntTree::empty();
        for (key, value) in entries {
            tree = tree.add_or_update(key, value);
            prop_assert_eq!(tree.check_invariants(), Ok(()));
        }
    }

    /// Enumeration yields strictly ascending keys.
    #[test]
    fn prop_enumeration_strictly_ascending(entries in arbitrary_entries(200)) {
        let tree = build(&entries);
        let keys: Vec<i32> = tree.iter().map(|(key, _)| key).collect();
        prop_assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
    }

    /// Height stays within the AVL bound of 1.44 * log2(n + 2).
    #[test]
    fn prop_height_is_logarithmic(entries in arbitrary_entries(300)) {
        let tree = build(&entries);
        #[allow(clippy::cast_precision_loss)]
        let bound = 1.45 * ((tree.len() + 2) as f64).log2();
        prop_assert!(f64::from(tree.height()) <= bound);
    }
}

// =============================================================================
// Round Trip Laws
// =============================================================================

proptest! {
    /// Insertion order does not matter: the tree agrees with a BTreeMap
    /// built from the same entries.
    #[test]
    fn prop_matches_reference_map(entries in arbitrary_entries(200)) {
        let tree = build(&entries);
        let reference: BTreeMap<i32, i32> = entries.iter().copied().collect();

        let enumerated: Vec<(i32, i32)> = tree.iter().map(|(key, value)| (key, *value)).collect();
        let expected: Vec<(i32, i32)> = reference.into_iter().collect();
        prop_assert_eq!(tree.len(), expected.len());
        prop_assert_eq!(enumerated, expected);
    }

    /// Unique keys inserted in reverse give the same tree contents.
    #[test]
    fn prop_order_independent(keys in prop::collection::btree_set(any::<i32>(), 0..100)) {
        let forward: IntTree<i32> = keys.iter().map(|&key| (key, key)).collect();
        let backward: IntTree<i32> = keys.iter().rev().map(|&key| (key, key)).collect();
        prop_assert_eq!(&forward, &backward);
        for key in &keys {
            prop_assert_eq!(forward.try_get(*key), Some(key));
        }
    }

    /// Get after insert returns the inserted value.
    #[test]
    fn prop_get_add_law(entries in arbitrary_entries(50), key: i32, value: i32) {
        let tree = build(&entries).add_or_update(key, value);
        prop_assert_eq!(tree.try_get(key), Some(&value));
    }

    /// Inserting one key does not disturb any other.
    #[test]
    fn prop_get_add_other_law(entries in arbitrary_entries(50), key1: i32, key2: i32, value: i32) {
        prop_assume!(key1 != key2);
        let tree = build(&entries);
        let updated = tree.add_or_update(key1, value);
        prop_assert_eq!(updated.try_get(key2), tree.try_get(key2));
    }
}

// =============================================================================
// Persistence Laws
// =============================================================================

proptest! {
    /// Producing a new version leaves every lookup on the old one unchanged.
    #[test]
    fn prop_no_mutation(entries in arbitrary_entries(100), key: i32, value: i32) {
        let tree = build(&entries);
        let before: Vec<(i32, i32)> = tree.iter().map(|(key, value)| (key, *value)).collect();

        let _added = tree.add_or_update(key, value);
        let _updated = tree.update(key, value);

        let after: Vec<(i32, i32)> = tree.iter().map(|(key, value)| (key, *value)).collect();
        prop_assert_eq!(before, after);
    }

    /// Re-inserting an existing key keeps the entry count.
    #[test]
    fn prop_replace_in_place(entries in arbitrary_entries(100), value: i32) {
        prop_assume!(!entries.is_empty());
        let tree = build(&entries);
        let (key, _) = entries[0];
        let replaced = tree.add_or_update(key, value);
        prop_assert_eq!(replaced.len(), tree.len());
        prop_assert_eq!(replaced.iter().count(), tree.len());
        prop_assert_eq!(replaced.height(), tree.height());
    }

    /// Update on an absent key returns the same version.
    #[test]
    fn prop_update_absent_is_identity(entries in arbitrary_entries(100), key: i32, value: i32) {
        let tree = build(&entries);
        prop_assume!(!tree.contains_key(key));
        prop_assert!(tree.update(key, value).ptr_eq(&tree));
    }
}
