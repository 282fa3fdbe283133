//! Property-based tests for HashTree.
//!
//! Keys are drawn from a small domain and hashed into a handful of buckets
//! so that collision chains are exercised on most runs.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};

use proptest::prelude::*;
use swaptree::tree::HashTree;

/// Key whose hash only covers `id % 4`, forcing frequent collisions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CrowdedKey(u16);

impl Hash for CrowdedKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self.0 % 4).hash(state);
    }
}

fn arbitrary_entries(max_size: usize) -> impl Strategy<Value = Vec<(u16, i64)>> {
    prop::collection::vec((0_u16..64, any::<i64>()), 0..max_size)
}

fn build(entries: &[(u16, i64)]) -> HashTree<CrowdedKey, i64> {
    entries.iter().fold(HashTree::empty(), |map, &(id, value)| {
        map.add_or_update(CrowdedKey(id), value)
    })
}

proptest! {
    /// The map agrees with std's HashMap built from the same entries.
    #[test]
    fn prop_matches_reference_map(entries in arbitrary_entries(200)) {
        let map = build(&entries);
        let reference: HashMap<u16, i64> = entries.iter().copied().collect();

        prop_assert_eq!(map.len(), reference.len());
        prop_assert_eq!(map.iter().count(), reference.len());
        for (id, value) in &reference {
            prop_assert_eq!(map.try_get(&CrowdedKey(*id)), Some(value));
        }
        prop_assert!(map.bucket_count() <= 4);
    }

    /// Updating one colliding key leaves every other key untouched.
    #[test]
    fn prop_update_is_isolated(entries in arbitrary_entries(100), target in 0_u16..64, value: i64) {
        let map = build(&entries);
        let updated = map.add_or_update(CrowdedKey(target), value);

        prop_assert_eq!(updated.try_get(&CrowdedKey(target)), Some(&value));
        for id in 0_u16..64 {
            if id != target {
                prop_assert_eq!(updated.try_get(&CrowdedKey(id)), map.try_get(&CrowdedKey(id)));
            }
        }
    }

    /// Producing a new version never changes the old one.
    #[test]
    fn prop_no_mutation(entries in arbitrary_entries(100), id in 0_u16..64, value: i64) {
        let map = build(&entries);
        let before: Vec<(CrowdedKey, i64)> = map.iter().map(|(key, value)| (*key, *value)).collect();

        let _added = map.add_or_update(CrowdedKey(id), value);
        let _updated = map.update(CrowdedKey(id), value);

        let after: Vec<(CrowdedKey, i64)> = map.iter().map(|(key, value)| (*key, *value)).collect();
        prop_assert_eq!(before, after);
    }

    /// Update-only never grows the map.
    #[test]
    fn prop_update_never_inserts(entries in arbitrary_entries(100), id in 0_u16..64, value: i64) {
        let map = build(&entries);
        let updated = map.update(CrowdedKey(id), value);
        prop_assert_eq!(updated.len(), map.len());
        prop_assert_eq!(updated.contains_key(&CrowdedKey(id)), map.contains_key(&CrowdedKey(id)));
    }
}
