//! Per-scope singleton storage keyed by integer ids.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

use tracing::debug;

use crate::cell::AtomicTree;
use crate::tree::IntTree;

/// Caches singleton instances by id.
///
/// Ids come from [`next_id`](Self::next_id), typically handed out once per
/// singleton registration. The first instance published for an id wins:
/// if two threads create the same singleton concurrently, both receive the
/// instance that reached the cell first and the other is dropped.
///
/// # Examples
///
/// ```rust
/// use swaptree::registry::SingletonScope;
///
/// let scope = SingletonScope::new();
/// let id = scope.next_id();
///
/// let first = scope.get_or_create(id, || "connection".to_string());
/// let second = scope.get_or_create(id, || unreachable!());
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// ```
pub struct SingletonScope<T> {
    instances: AtomicTree<IntTree<Arc<T>>>,
    next_id: AtomicI32,
}

impl<T> SingletonScope<T> {
    /// Creates an empty scope whose ids start at 0.
    pub fn new() -> Self {
        Self {
            instances: AtomicTree::new(IntTree::empty()),
            next_id: AtomicI32::new(0),
        }
    }

    /// Hands out a fresh id. Ids wrap around after `i32::MAX`.
    pub fn next_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Returns the instance cached under `id`, if any.
    pub fn get(&self, id: i32) -> Option<Arc<T>> {
        self.instances.read(|tree| tree.try_get(id).cloned())
    }

    /// Returns the instance cached under `id`, creating and publishing one
    /// with `create` if there is none yet.
    ///
    /// `create` runs at most once per call and only when the id was absent
    /// at the time of the check. Its result is discarded if another thread
    /// publishes an instance for the same id first.
    pub fn get_or_create<F>(&self, id: i32, create: F) -> Arc<T>
    where
        F: FnOnce() -> T,
    {
        if let Some(existing) = self.get(id) {
            return existing;
        }

        let created = Arc::new(create());
        let published = self.instances.publish(|current| {
            if current.contains_key(id) {
                None
            } else {
                Some(current.add_or_update(id, Arc::clone(&created)))
            }
        });

        let winner = published
            .try_get(id)
            .map_or_else(|| Arc::clone(&created), Arc::clone);
        if Arc::ptr_eq(&winner, &created) {
            debug!(id, "singleton created");
        } else {
            debug!(id, "singleton created concurrently, keeping published instance");
        }
        winner
    }

    /// Returns the ids that currently hold an instance, ascending.
    pub fn ids(&self) -> Vec<i32> {
        self.instances
            .read(|tree| tree.iter().map(|(id, _)| id).collect())
    }

    /// Returns the current set of instances as an immutable snapshot.
    pub fn snapshot(&self) -> Arc<IntTree<Arc<T>>> {
        self.instances.load()
    }

    /// Returns the number of cached instances.
    pub fn len(&self) -> usize {
        self.instances.read(IntTree::len)
    }

    /// Returns `true` if no instance is cached.
    pub fn is_empty(&self) -> bool {
        self.instances.read(IntTree::is_empty)
    }
}

impl<T> Default for SingletonScope<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for SingletonScope<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SingletonScope")
            .field("instances", &self.instances)
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}
