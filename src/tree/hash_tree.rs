//! Persistent map for arbitrary `Hash + Eq` keys, layered over [`IntTree`].
//!
//! Keys are hashed and folded to an `i32`, which becomes the key in the
//! underlying AVL tree. Every bucket stores a short singly-linked chain of
//! `(key, value)` entries; the chain has length one unless two distinct keys
//! produce the same folded hash.
//!
//! # Examples
//!
//! ```rust
//! use swaptree::tree::HashTree;
//!
//! let services = HashTree::empty()
//!     .add_or_update("logger".to_string(), 1)
//!     .add_or_update("clock".to_string(), 2);
//!
//! assert_eq!(services.try_get("logger"), Some(&1));
//! assert_eq!(services.try_get("missing"), None);
//! ```

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::{FromIterator, FusedIterator};
use std::sync::Arc;

use super::int_tree::{IntTree, IntTreeIntoIterator, IntTreeIterator};
use super::{DefaultHashBuilder, PersistentTree, default_hash_builder};

// =============================================================================
// Collision Chain
// =============================================================================

/// One entry of a hash bucket. Entries under one bucket share a folded
/// hash and have pairwise distinct keys.
#[derive(Clone)]
struct Bucket<K, V> {
    key: K,
    value: V,
    next: Option<Arc<Self>>,
}

impl<K, V> Bucket<K, V> {
    const fn single(key: K, value: V) -> Self {
        Self {
            key,
            value,
            next: None,
        }
    }

    fn find<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let mut current = Some(self);
        while let Some(entry) = current {
            if entry.key.borrow() == key {
                return Some(&entry.value);
            }
            current = entry.next.as_deref();
        }
        None
    }

    fn chain_len(&self) -> usize {
        let mut length = 0;
        let mut current = Some(self);
        while let Some(entry) = current {
            length += 1;
            current = entry.next.as_deref();
        }
        length
    }
}

impl<K: Clone + Eq, V: Clone> Bucket<K, V> {
    /// Returns a chain holding `key -> value` and whether the key is new.
    ///
    /// Only the entries in front of the match (or the whole chain, when
    /// appending) are copied; the tail after a match is shared.
    fn with_entry(&self, key: K, value: V) -> (Self, bool) {
        if self.key == key {
            return (
                Self {
                    key,
                    value,
                    next: self.next.clone(),
                },
                false,
            );
        }

        let (next, added) = match &self.next {
            Some(next) => next.with_entry(key, value),
            None => (Self::single(key, value), true),
        };

        (
            Self {
                key: self.key.clone(),
                value: self.value.clone(),
                next: Some(Arc::new(next)),
            },
            added,
        )
    }

    /// Returns a chain with the value of `key` replaced, or `None` if the
    /// chain does not contain `key`.
    fn replaced(&self, key: K, value: V) -> Option<Self> {
        if self.key == key {
            return Some(Self {
                key,
                value,
                next: self.next.clone(),
            });
        }

        let next = self.next.as_ref()?.replaced(key, value)?;
        Some(Self {
            key: self.key.clone(),
            value: self.value.clone(),
            next: Some(Arc::new(next)),
        })
    }
}

// =============================================================================
// HashTree Definition
// =============================================================================

/// A persistent (immutable) map from hashable keys to values.
///
/// `HashTree` delegates all balancing to [`IntTree`] and adds only the
/// hashing step and the collision chains. Like `IntTree`, every update
/// returns a new version that shares unaffected structure with the old one.
///
/// The map owns one hasher `S` and hands it to every version derived from
/// it, so randomly seeded builders such as `RandomState` work. The default,
/// [`DefaultHashBuilder`], depends on the enabled cargo features.
///
/// # Examples
///
/// ```rust
/// use std::any::TypeId;
/// use swaptree::tree::HashTree;
///
/// let registry = HashTree::empty()
///     .add_or_update(TypeId::of::<String>(), "string factory")
///     .add_or_update(TypeId::of::<u64>(), "u64 factory");
///
/// assert_eq!(registry.try_get(&TypeId::of::<u64>()), Some(&"u64 factory"));
/// assert_eq!(registry.try_get(&TypeId::of::<u8>()), None);
/// ```
pub struct HashTree<K, V, S = DefaultHashBuilder> {
    buckets: IntTree<Bucket<K, V>>,
    length: usize,
    hash_builder: S,
}

impl<K, V> HashTree<K, V, DefaultHashBuilder> {
    /// Returns the empty map using the default hasher. Does not allocate.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self::with_hasher(default_hash_builder())
    }

    /// Alias of [`empty`](Self::empty).
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::empty()
    }
}

impl<K, V, S> HashTree<K, V, S> {
    /// Returns the empty map hashing with `hash_builder`. Does not allocate.
    ///
    /// Every version derived from this map keeps a clone of the same
    /// builder, so its keys hash identically across versions.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::hash_map::RandomState;
    /// use swaptree::tree::HashTree;
    ///
    /// let map = HashTree::with_hasher(RandomState::new())
    ///     .add_or_update("key", 1)
    ///     .add_or_update("key", 2);
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(map.try_get("key"), Some(&2));
    /// ```
    #[inline]
    #[must_use]
    pub const fn with_hasher(hash_builder: S) -> Self {
        Self {
            buckets: IntTree::empty(),
            length: 0,
            hash_builder,
        }
    }

    /// Returns the map's hash builder.
    #[inline]
    pub const fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map has no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the number of distinct hash buckets.
    ///
    /// Equal to [`len`](Self::len) unless some keys collide.
    #[inline]
    #[must_use]
    pub const fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the length of the longest collision chain (0 when empty).
    #[must_use]
    pub fn longest_chain(&self) -> usize {
        self.buckets
            .iter()
            .map(|(_, bucket)| bucket.chain_len())
            .max()
            .unwrap_or(0)
    }

    /// Returns `true` if both maps are the same version.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.buckets.ptr_eq(&other.buckets)
    }

    /// Returns an iterator over `(&key, &value)` pairs.
    ///
    /// Entries are ordered by folded hash, and by insertion order within one
    /// bucket. The order is stable for a given version.
    pub fn iter(&self) -> HashTreeIterator<'_, K, V> {
        HashTreeIterator {
            buckets: self.buckets.iter(),
            chain: None,
            remaining: self.length,
        }
    }
}

impl<K, V, S: BuildHasher> HashTree<K, V, S> {
    /// Hashes `key` with this map's builder and folds the 64-bit result to
    /// 32 bits.
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    fn hash_of<Q: Hash + ?Sized>(&self, key: &Q) -> i32 {
        let hash = self.hash_builder.hash_one(key);
        ((hash >> 32) ^ hash) as u32 as i32
    }

    /// Looks up `key`, returning its value if present.
    ///
    /// The key may be any borrowed form of `K` whose `Hash` and `Eq` agree
    /// with `K`'s.
    #[must_use]
    pub fn try_get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets
            .try_get(self.hash_of(key))
            .and_then(|bucket| bucket.find(key))
    }

    /// Looks up `key`, falling back to `default` when it is absent.
    #[must_use]
    pub fn get_or_default<'a, Q>(&'a self, key: &Q, default: &'a V) -> &'a V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.try_get(key).unwrap_or(default)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.try_get(key).is_some()
    }
}

impl<K, V, S> HashTree<K, V, S>
where
    K: Clone + Hash + Eq,
    V: Clone,
    S: BuildHasher + Clone,
{
    /// Inserts `key` if absent, or replaces its value if present.
    ///
    /// A key whose hash collides with a different key is appended to that
    /// bucket's chain; neither entry disturbs the other.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swaptree::tree::HashTree;
    ///
    /// let first = HashTree::empty().add_or_update("key", 1);
    /// let second = first.add_or_update("key", 2);
    ///
    /// assert_eq!(first.try_get("key"), Some(&1));
    /// assert_eq!(second.try_get("key"), Some(&2));
    /// assert_eq!(second.len(), 1);
    /// ```
    #[must_use]
    pub fn add_or_update(&self, key: K, value: V) -> Self {
        let hash = self.hash_of(&key);
        let mut added = false;

        let buckets = self.buckets.add_or_update_with(hash, |existing| match existing {
            Some(chain) => {
                let (chain, key_was_new) = chain.with_entry(key, value);
                added = key_was_new;
                chain
            }
            None => {
                added = true;
                Bucket::single(key, value)
            }
        });

        Self {
            buckets,
            length: if added { self.length + 1 } else { self.length },
            hash_builder: self.hash_builder.clone(),
        }
    }

    /// Replaces the value of an existing `key`; a no-op returning the same
    /// version when the key is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swaptree::tree::HashTree;
    ///
    /// let map = HashTree::empty().add_or_update("present", 1);
    /// assert_eq!(map.update("present", 2).try_get("present"), Some(&2));
    /// assert!(map.update("absent", 3).ptr_eq(&map));
    /// ```
    #[must_use]
    pub fn update(&self, key: K, value: V) -> Self {
        let hash = self.hash_of(&key);

        let rewritten = self
            .buckets
            .try_get(hash)
            .and_then(|chain| chain.replaced(key, value));

        match rewritten {
            Some(chain) => Self {
                buckets: self.buckets.update(hash, chain),
                length: self.length,
                hash_builder: self.hash_builder.clone(),
            },
            None => self.clone(),
        }
    }
}

impl<K, V, S> PersistentTree for HashTree<K, V, S>
where
    K: Clone + Hash + Eq,
    V: Clone,
    S: BuildHasher + Clone,
{
    type Key = K;
    type Value = V;

    fn add_or_update(&self, key: K, value: V) -> Self {
        Self::add_or_update(self, key, value)
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// An iterator over the entries of a [`HashTree`].
pub struct HashTreeIterator<'a, K, V> {
    buckets: IntTreeIterator<'a, Bucket<K, V>>,
    chain: Option<&'a Bucket<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for HashTreeIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.chain {
                self.chain = entry.next.as_deref();
                self.remaining = self.remaining.saturating_sub(1);
                return Some((&entry.key, &entry.value));
            }
            let (_, bucket) = self.buckets.next()?;
            self.chain = Some(bucket);
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for HashTreeIterator<'_, K, V> {}

impl<K, V> FusedIterator for HashTreeIterator<'_, K, V> {}

/// An owning iterator over the entries of a [`HashTree`].
///
/// Keeps the snapshot alive by reference count and yields cloned entries,
/// in the same order as [`HashTree::iter`].
pub struct HashTreeIntoIterator<K, V> {
    buckets: IntTreeIntoIterator<Bucket<K, V>>,
    chain: Option<Arc<Bucket<K, V>>>,
    remaining: usize,
}

impl<K: Clone, V: Clone> Iterator for HashTreeIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let Bucket { key, value, next } = match self.chain.take() {
            Some(entry) => Arc::unwrap_or_clone(entry),
            None => self.buckets.next()?.1,
        };
        self.chain = next;
        self.remaining = self.remaining.saturating_sub(1);
        Some((key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Clone, V: Clone> ExactSizeIterator for HashTreeIntoIterator<K, V> {}

impl<K: Clone, V: Clone> FusedIterator for HashTreeIntoIterator<K, V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V, S: Clone> Clone for HashTree<K, V, S> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            length: self.length,
            hash_builder: self.hash_builder.clone(),
        }
    }
}

impl<K, V, S: Default> Default for HashTree<K, V, S> {
    #[inline]
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashTree<K, V, S>
where
    K: Clone + Hash + Eq,
    V: Clone,
    S: BuildHasher + Clone + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<K, V, S> Extend<(K, V)> for HashTree<K, V, S>
where
    K: Clone + Hash + Eq,
    V: Clone,
    S: BuildHasher + Clone,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            *self = self.add_or_update(key, value);
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashTree<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = HashTreeIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Clone, V: Clone, S> IntoIterator for HashTree<K, V, S> {
    type Item = (K, V);
    type IntoIter = HashTreeIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        HashTreeIntoIterator {
            buckets: self.buckets.into_iter(),
            chain: None,
            remaining: self.length,
        }
    }
}

impl<K, V, S> PartialEq for HashTree<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length
            && self
                .iter()
                .all(|(key, value)| other.try_get(key) == Some(value))
    }
}

impl<K: Hash + Eq, V: Eq, S: BuildHasher> Eq for HashTree<K, V, S> {}

impl<K: fmt::Debug, V: fmt::Debug, S> fmt::Debug for HashTree<K, V, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<K, V, S> serde::Serialize for HashTree<K, V, S>
where
    K: serde::Serialize,
    V: serde::Serialize,
{
    fn serialize<Ser>(&self, serializer: Ser) -> Result<Ser::Ok, Ser::Error>
    where
        Ser: serde::Serializer,
    {
        serializer.collect_map(self.iter())
    }
}

#[cfg(feature = "serde")]
struct HashTreeVisitor<K, V, S> {
    marker: std::marker::PhantomData<fn() -> HashTree<K, V, S>>,
}

#[cfg(feature = "serde")]
impl<'de, K, V, S> serde::de::Visitor<'de> for HashTreeVisitor<K, V, S>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone,
    S: BuildHasher + Clone + Default,
{
    type Value = HashTree<K, V, S>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut map = HashTree::default();
        while let Some((key, value)) = access.next_entry::<K, V>()? {
            map = map.add_or_update(key, value);
        }
        Ok(map)
    }
}

#[cfg(feature = "serde")]
impl<'de, K, V, S> serde::Deserialize<'de> for HashTree<K, V, S>
where
    K: serde::Deserialize<'de> + Clone + Hash + Eq,
    V: serde::Deserialize<'de> + Clone,
    S: BuildHasher + Clone + Default,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(HashTreeVisitor {
            marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
