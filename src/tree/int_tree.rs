//! Persistent (immutable) AVL tree keyed by `i32`.
//!
//! This module provides [`IntTree`], the map that backs service registries
//! and singleton scopes. It is tuned for many concurrent readers and rare
//! writers:
//!
//! - O(log N) lookup by plain integer comparison, no hashing
//! - O(log N) `add_or_update`, copying only the root-to-key path
//! - O(1) `empty`, `len`, `is_empty`, `height`
//! - In-order iteration over an immutable snapshot
//!
//! # Examples
//!
//! ```rust
//! use swaptree::tree::IntTree;
//!
//! let tree = IntTree::empty().add_or_update(5, "a");
//! assert_eq!(tree.get_or_default(5, &""), &"a");
//! assert_eq!(tree.try_get(6), None);
//!
//! // The previous version is left untouched
//! let replaced = tree.add_or_update(5, "b");
//! assert_eq!(tree.try_get(5), Some(&"a"));
//! assert_eq!(replaced.try_get(5), Some(&"b"));
//! assert_eq!(replaced.len(), 1);
//! ```
//!
//! # Internal Structure
//!
//! Every node satisfies:
//! 1. Keys in the left subtree are smaller, keys in the right are larger
//! 2. Sibling subtree heights differ by at most one
//! 3. `height = 1 + max(height(left), height(right))`, empty height is 0
//!
//! An AVL tree of N entries is at most about `1.44 * log2(N + 2)` high.

use std::cmp::Ordering;
use std::fmt;
use std::iter::{FromIterator, FusedIterator};
use std::sync::Arc;

use smallvec::SmallVec;

use super::PersistentTree;
use super::invariant::{InvariantError, check_subtree};
use super::node::{Link, Node, rebalance};

/// Inline capacity of the iteration stack. An AVL tree holding every `i32`
/// key is at most 46 levels high, so iteration never spills to the heap.
const STACK_CAPACITY: usize = 48;

// =============================================================================
// IntTree Definition
// =============================================================================

/// A persistent (immutable) ordered map from `i32` keys to values.
///
/// Cloning an `IntTree` is O(1): it copies a pointer and a count. All
/// versions produced by [`add_or_update`](Self::add_or_update) share
/// unaffected subtrees, so keeping old versions alive is cheap.
///
/// `IntTree<V>` is `Send + Sync` whenever `V` is, so a snapshot may be read
/// from any number of threads without synchronization.
///
/// # Time Complexity
///
/// | Operation        | Complexity |
/// |------------------|------------|
/// | `empty`          | O(1)       |
/// | `try_get`        | O(log N)   |
/// | `add_or_update`  | O(log N)   |
/// | `update`         | O(log N)   |
/// | `len`/`height`   | O(1)       |
/// | `iter`           | O(N)       |
///
/// # Examples
///
/// ```rust
/// use swaptree::tree::IntTree;
///
/// let tree: IntTree<&str> = [(3, "three"), (1, "one"), (2, "two")]
///     .into_iter()
///     .collect();
///
/// let keys: Vec<i32> = tree.iter().map(|(key, _)| key).collect();
/// assert_eq!(keys, vec![1, 2, 3]);
/// ```
pub struct IntTree<V> {
    root: Link<V>,
    length: usize,
}

impl<V> IntTree<V> {
    /// Returns the empty tree.
    ///
    /// This does not allocate; every empty tree is the same sentinel.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swaptree::tree::IntTree;
    ///
    /// const EMPTY: IntTree<String> = IntTree::empty();
    /// assert!(EMPTY.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            root: None,
            length: 0,
        }
    }

    /// Alias of [`empty`](Self::empty).
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::empty()
    }

    /// Returns the number of entries.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the tree has no entries.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the height of the tree. The empty tree has height 0.
    #[inline]
    #[must_use]
    pub fn height(&self) -> i32 {
        self.root.as_ref().map_or(0, |root| root.height)
    }

    /// Returns `true` if both trees are the same version, i.e. share the
    /// same root node.
    ///
    /// Two empty trees are always the same version.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swaptree::tree::IntTree;
    ///
    /// let tree = IntTree::empty().add_or_update(1, 'x');
    /// assert!(tree.ptr_eq(&tree.clone()));
    /// assert!(!tree.ptr_eq(&tree.add_or_update(1, 'x')));
    /// ```
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(left), Some(right)) => Arc::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }

    /// Looks up `key` and returns its value, if present.
    ///
    /// A missing key is not an error; use this when a legitimately stored
    /// value could be confused with a default.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swaptree::tree::IntTree;
    ///
    /// let tree = IntTree::empty().add_or_update(i32::MIN, 0);
    /// assert_eq!(tree.try_get(i32::MIN), Some(&0));
    /// assert_eq!(tree.try_get(0), None);
    /// ```
    #[must_use]
    pub fn try_get(&self, key: i32) -> Option<&V> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(&node.key) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.value),
            };
        }
        None
    }

    /// Looks up `key`, falling back to `default` when it is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swaptree::tree::IntTree;
    ///
    /// let tree = IntTree::empty().add_or_update(5, Some("a"));
    /// assert_eq!(tree.get_or_default(5, &None), &Some("a"));
    /// assert_eq!(tree.get_or_default(6, &None), &None);
    /// ```
    #[must_use]
    pub fn get_or_default<'a>(&'a self, key: i32, default: &'a V) -> &'a V {
        self.try_get(key).unwrap_or(default)
    }

    /// Returns `true` if `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: i32) -> bool {
        self.try_get(key).is_some()
    }

    /// Returns a lazy in-order iterator over `(key, &value)` pairs.
    ///
    /// Keys come out strictly ascending. The iterator borrows this version
    /// only, so it is unaffected by later versions published elsewhere, and
    /// calling `iter` again restarts from the smallest key.
    pub fn iter(&self) -> IntTreeIterator<'_, V> {
        IntTreeIterator::new(self.root.as_deref(), self.length)
    }

    /// Verifies search order, AVL balance, cached heights and the cached
    /// entry count, reporting the first violation found.
    ///
    /// # Errors
    ///
    /// Returns the [`InvariantError`] describing the first violated
    /// invariant.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swaptree::tree::IntTree;
    ///
    /// let tree: IntTree<i32> = (0..100).map(|key| (key, key)).collect();
    /// assert!(tree.check_invariants().is_ok());
    /// ```
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let counted = check_subtree(self.root.as_ref(), None, None)?;
        if counted == self.length {
            Ok(())
        } else {
            Err(InvariantError::LengthMismatch {
                recorded: self.length,
                counted,
            })
        }
    }
}

impl<V: Clone> IntTree<V> {
    /// Inserts `key` if absent, or replaces its value if present.
    ///
    /// Replacing a value never changes the tree's shape or height. Inserting
    /// copies the nodes on the path to the new leaf and rebalances them;
    /// every other subtree is shared with `self`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swaptree::tree::IntTree;
    ///
    /// let first = IntTree::empty().add_or_update(1, "one");
    /// let second = first.add_or_update(2, "two");
    ///
    /// assert_eq!(first.len(), 1);
    /// assert_eq!(second.len(), 2);
    /// ```
    #[must_use]
    pub fn add_or_update(&self, key: i32, value: V) -> Self {
        self.add_or_update_with(key, |_| value)
    }

    /// Like [`add_or_update`](Self::add_or_update), computing the stored
    /// value from the existing one (if any) in the same descent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swaptree::tree::IntTree;
    ///
    /// let tree = IntTree::empty().add_or_update(1, 10);
    /// let bumped = tree.add_or_update_with(1, |current| current.map_or(0, |value| value + 1));
    /// let fresh = tree.add_or_update_with(2, |current| current.map_or(0, |value| value + 1));
    ///
    /// assert_eq!(bumped.try_get(1), Some(&11));
    /// assert_eq!(fresh.try_get(2), Some(&0));
    /// ```
    #[must_use]
    pub fn add_or_update_with<F>(&self, key: i32, make_value: F) -> Self
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let (root, added) = Self::insert_into(self.root.as_ref(), key, make_value);
        Self {
            root: Some(root),
            length: if added { self.length + 1 } else { self.length },
        }
    }

    /// Recursive helper for insertion.
    /// Returns the new subtree and whether a new entry was added.
    fn insert_into<F>(link: Option<&Arc<Node<V>>>, key: i32, make_value: F) -> (Arc<Node<V>>, bool)
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let Some(node) = link else {
            return (Arc::new(Node::leaf(key, make_value(None))), true);
        };

        match key.cmp(&node.key) {
            Ordering::Less => {
                let (left, added) = Self::insert_into(node.left.as_ref(), key, make_value);
                let rebuilt = node.with_left(Some(left));
                if added {
                    (Arc::new(rebalance(rebuilt)), true)
                } else {
                    (Arc::new(rebuilt), false)
                }
            }
            Ordering::Greater => {
                let (right, added) = Self::insert_into(node.right.as_ref(), key, make_value);
                let rebuilt = node.with_right(Some(right));
                if added {
                    (Arc::new(rebalance(rebuilt)), true)
                } else {
                    (Arc::new(rebuilt), false)
                }
            }
            Ordering::Equal => {
                let value = make_value(Some(&node.value));
                (Arc::new(node.with_value(value)), false)
            }
        }
    }

    /// Replaces the value of an existing `key`.
    ///
    /// When `key` is absent this is a no-op: the returned tree is the same
    /// version as `self` (see [`ptr_eq`](Self::ptr_eq)).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use swaptree::tree::IntTree;
    ///
    /// let tree = IntTree::empty().add_or_update(1, "one");
    ///
    /// let replaced = tree.update(1, "ONE");
    /// assert_eq!(replaced.try_get(1), Some(&"ONE"));
    ///
    /// let untouched = tree.update(2, "two");
    /// assert!(untouched.ptr_eq(&tree));
    /// assert_eq!(untouched.try_get(2), None);
    /// ```
    #[must_use]
    pub fn update(&self, key: i32, value: V) -> Self {
        Self::replace_in(self.root.as_ref(), key, value).map_or_else(
            || self.clone(),
            |root| Self {
                root: Some(root),
                length: self.length,
            },
        )
    }

    /// Recursive helper for update. Returns `None` if the key is absent.
    fn replace_in(link: Option<&Arc<Node<V>>>, key: i32, value: V) -> Option<Arc<Node<V>>> {
        let node = link?;
        match key.cmp(&node.key) {
            Ordering::Less => Self::replace_in(node.left.as_ref(), key, value)
                .map(|left| Arc::new(node.with_left(Some(left)))),
            Ordering::Greater => Self::replace_in(node.right.as_ref(), key, value)
                .map(|right| Arc::new(node.with_right(Some(right)))),
            Ordering::Equal => Some(Arc::new(node.with_value(value))),
        }
    }
}

impl<V: Clone> PersistentTree for IntTree<V> {
    type Key = i32;
    type Value = V;

    fn add_or_update(&self, key: i32, value: V) -> Self {
        Self::add_or_update(self, key, value)
    }
}

// =============================================================================
// Iterator Implementation
// =============================================================================

/// A borrowing in-order iterator over an [`IntTree`].
pub struct IntTreeIterator<'a, V> {
    stack: SmallVec<[&'a Node<V>; STACK_CAPACITY]>,
    remaining: usize,
}

impl<'a, V> IntTreeIterator<'a, V> {
    fn new(root: Option<&'a Node<V>>, length: usize) -> Self {
        let mut iterator = Self {
            stack: SmallVec::new(),
            remaining: length,
        };
        iterator.descend_left(root);
        iterator
    }

    fn descend_left(&mut self, mut current: Option<&'a Node<V>>) {
        while let Some(node) = current {
            self.stack.push(node);
            current = node.left.as_deref();
        }
    }
}

impl<'a, V> Iterator for IntTreeIterator<'a, V> {
    type Item = (i32, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.descend_left(node.right.as_deref());
        self.remaining = self.remaining.saturating_sub(1);
        Some((node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntTreeIterator<'_, V> {}

impl<V> FusedIterator for IntTreeIterator<'_, V> {}

/// An owning in-order iterator over an [`IntTree`].
///
/// Holds the snapshot's nodes alive by reference count and yields cloned
/// values, so it can outlive the handle it was created from.
pub struct IntTreeIntoIterator<V> {
    stack: SmallVec<[Arc<Node<V>>; STACK_CAPACITY]>,
    remaining: usize,
}

impl<V> IntTreeIntoIterator<V> {
    fn descend_left(&mut self, mut current: Link<V>) {
        while let Some(node) = current {
            current = node.left.clone();
            self.stack.push(node);
        }
    }
}

impl<V: Clone> Iterator for IntTreeIntoIterator<V> {
    type Item = (i32, V);

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.descend_left(node.right.clone());
        self.remaining = self.remaining.saturating_sub(1);
        Some((node.key, node.value.clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V: Clone> ExactSizeIterator for IntTreeIntoIterator<V> {}

impl<V: Clone> FusedIterator for IntTreeIntoIterator<V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<V> Clone for IntTree<V> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            length: self.length,
        }
    }
}

impl<V> Default for IntTree<V> {
    #[inline]
    fn default() -> Self {
        Self::empty()
    }
}

impl<V: Clone> FromIterator<(i32, V)> for IntTree<V> {
    fn from_iter<I: IntoIterator<Item = (i32, V)>>(iter: I) -> Self {
        let mut tree = Self::empty();
        tree.extend(iter);
        tree
    }
}

impl<V: Clone> Extend<(i32, V)> for IntTree<V> {
    fn extend<I: IntoIterator<Item = (i32, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            *self = self.add_or_update(key, value);
        }
    }
}

impl<V: Clone> IntoIterator for IntTree<V> {
    type Item = (i32, V);
    type IntoIter = IntTreeIntoIterator<V>;

    fn into_iter(self) -> Self::IntoIter {
        let mut iterator = IntTreeIntoIterator {
            stack: SmallVec::new(),
            remaining: self.length,
        };
        iterator.descend_left(self.root);
        iterator
    }
}

impl<'a, V> IntoIterator for &'a IntTree<V> {
    type Item = (i32, &'a V);
    type IntoIter = IntTreeIterator<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<V: PartialEq> PartialEq for IntTree<V> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.length == other.length && self.iter().eq(other.iter()))
    }
}

impl<V: Eq> Eq for IntTree<V> {}

impl<V: fmt::Debug> fmt::Debug for IntTree<V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

// =============================================================================
// Serde Support
// =============================================================================

#[cfg(feature = "serde")]
impl<V> serde::Serialize for IntTree<V>
where
    V: serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self {
            map.serialize_entry(&key, value)?;
        }
        map.end()
    }
}

#[cfg(feature = "serde")]
struct IntTreeVisitor<V> {
    value_marker: std::marker::PhantomData<V>,
}

#[cfg(feature = "serde")]
impl<'de, V> serde::de::Visitor<'de> for IntTreeVisitor<V>
where
    V: serde::Deserialize<'de> + Clone,
{
    type Value = IntTree<V>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map with integer keys")
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: serde::de::MapAccess<'de>,
    {
        let mut tree = IntTree::empty();
        while let Some((key, value)) = access.next_entry::<i32, V>()? {
            tree = tree.add_or_update(key, value);
        }
        Ok(tree)
    }
}

#[cfg(feature = "serde")]
impl<'de, V> serde::Deserialize<'de> for IntTree<V>
where
    V: serde::Deserialize<'de> + Clone,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_map(IntTreeVisitor {
            value_marker: std::marker::PhantomData,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
