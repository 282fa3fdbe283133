//! Lock-free publication cell.

use std::fmt;
use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use tracing::trace;

use super::PublishCell;

/// A shared "current version" cell, updated by compare-and-swap.
///
/// Readers load the current `Arc<T>` without blocking and keep reading that
/// version for as long as they hold it. Writers derive a candidate from the
/// version they loaded and install it only if no other writer got there
/// first; otherwise they retry from the newer version. No write is lost and
/// no reader ever sees a half-built tree.
///
/// Under heavy write contention a writer may retry many times. Writes to a
/// registry are rare (startup registration, first singleton creation), so
/// this is accepted in exchange for readers never waiting.
///
/// # Examples
///
/// ```rust
/// use swaptree::cell::AtomicTree;
/// use swaptree::tree::IntTree;
///
/// let cell = AtomicTree::new(IntTree::empty());
/// cell.publish(|tree| Some(tree.add_or_update(1, "one")));
///
/// assert_eq!(cell.load().try_get(1), Some(&"one"));
/// ```
pub struct AtomicTree<T> {
    slot: ArcSwap<T>,
}

impl<T> AtomicTree<T> {
    /// Creates a cell holding `tree` as its first version.
    pub fn new(tree: T) -> Self {
        Self {
            slot: ArcSwap::from_pointee(tree),
        }
    }

    /// Returns the current version.
    pub fn load(&self) -> Arc<T> {
        self.slot.load_full()
    }

    /// Runs `reader` against the current version without taking a
    /// reference count. Prefer this for short lookups on hot paths.
    pub fn read<R>(&self, reader: impl FnOnce(&T) -> R) -> R {
        let guard = self.slot.load();
        let current: &T = &guard;
        reader(current)
    }

    /// Publishes the version computed by `update` from the current one.
    ///
    /// `update` may run several times if other writers race; it must be a
    /// pure function of the version it is given. Returning `None` leaves the
    /// cell untouched. Returns the version that is current once this call
    /// has taken effect.
    pub fn publish<F>(&self, mut update: F) -> Arc<T>
    where
        F: FnMut(&T) -> Option<T>,
    {
        let mut snapshot = self.slot.load_full();
        let mut attempts: u32 = 0;

        loop {
            let current: &T = &snapshot;
            let Some(candidate) = update(current) else {
                return snapshot;
            };

            let candidate = Arc::new(candidate);
            let previous = self.slot.compare_and_swap(&snapshot, Arc::clone(&candidate));

            if Arc::ptr_eq(&*previous, &snapshot) {
                if attempts > 0 {
                    trace!(attempts, "tree published after contention");
                }
                return candidate;
            }

            attempts += 1;
            trace!(attempts, "tree publication raced with another writer, retrying");
            snapshot = Guard::into_inner(previous);
        }
    }

    /// Unconditionally replaces the current version.
    pub fn store(&self, tree: T) {
        self.slot.store(Arc::new(tree));
    }
}

impl<T> PublishCell<T> for AtomicTree<T> {
    fn load(&self) -> Arc<T> {
        Self::load(self)
    }

    fn publish<F>(&self, update: F) -> Arc<T>
    where
        F: FnMut(&T) -> Option<T>,
    {
        Self::publish(self, update)
    }

    fn store(&self, tree: T) {
        Self::store(self, tree);
    }
}

impl<T: Default> Default for AtomicTree<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for AtomicTree<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("AtomicTree")
            .field(&*self.slot.load())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::IntTree;
    use rstest::rstest;

    #[rstest]
    fn test_publish_installs_candidate() {
        let cell = AtomicTree::new(IntTree::empty());
        let published = cell.publish(|tree| Some(tree.add_or_update(3, 'c')));

        let current = cell.load();
        assert!(Arc::ptr_eq(&published, &current));
        assert_eq!(current.try_get(3), Some(&'c'));
    }

    #[rstest]
    fn test_publish_none_keeps_current_version() {
        let cell = AtomicTree::new(IntTree::empty().add_or_update(1, 'a'));
        let before = cell.load();

        let returned = cell.publish(|_| None);

        assert!(Arc::ptr_eq(&before, &returned));
        assert!(Arc::ptr_eq(&before, &cell.load()));
    }

    #[rstest]
    fn test_retry_sees_version_installed_by_racing_writer() {
        let cell = AtomicTree::new(IntTree::empty());
        let mut calls = 0;

        cell.publish(|tree| {
            calls += 1;
            if calls == 1 {
                // Another writer wins while this candidate is being built.
                cell.store(tree.add_or_update(1, "racer"));
            }
            Some(tree.add_or_update(2, "retried"))
        });

        let current = cell.load();
        assert_eq!(calls, 2);
        assert_eq!(current.try_get(1), Some(&"racer"));
        assert_eq!(current.try_get(2), Some(&"retried"));
    }

    #[rstest]
    fn test_old_snapshot_survives_publication() {
        let cell = AtomicTree::new(IntTree::empty().add_or_update(1, "old"));
        let snapshot = cell.load();

        cell.publish(|tree| Some(tree.add_or_update(1, "new")));

        assert_eq!(snapshot.try_get(1), Some(&"old"));
        assert_eq!(cell.read(|tree| tree.try_get(1).copied()), Some("new"));
    }
}
