//! Lock-guarded publication cell.

use std::fmt;
use std::sync::Arc;

use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use tracing::trace;

use super::PublishCell;

/// A "current version" cell whose writers take turns behind a lock.
///
/// Observably identical to [`AtomicTree`](super::AtomicTree): readers get a
/// whole version, writers never lose each other's updates. Writers never
/// retry here; instead they wait for one another. A writer builds its
/// candidate under an upgradable read lock, so readers keep loading the
/// current version meanwhile and only wait for the pointer swap. Use it
/// where atomic reference replacement is unavailable or unwanted.
///
/// # Examples
///
/// ```rust
/// use swaptree::cell::{LockedTree, update_slot};
/// use swaptree::tree::HashTree;
///
/// let cell = LockedTree::new(HashTree::empty());
/// update_slot(&cell, "clock", 1);
///
/// assert_eq!(cell.load().try_get("clock"), Some(&1));
/// ```
pub struct LockedTree<T> {
    slot: RwLock<Arc<T>>,
}

impl<T> LockedTree<T> {
    /// Creates a cell holding `tree` as its first version.
    pub fn new(tree: T) -> Self {
        Self {
            slot: RwLock::new(Arc::new(tree)),
        }
    }

    /// Returns the current version.
    pub fn load(&self) -> Arc<T> {
        Arc::clone(&self.slot.read())
    }

    /// Publishes the version computed by `update` from the current one.
    ///
    /// `update` runs exactly once, holding the upgradable read lock: other
    /// writers wait, readers do not. The lock is upgraded only to install
    /// the result. Returning `None` leaves the cell untouched.
    pub fn publish<F>(&self, mut update: F) -> Arc<T>
    where
        F: FnMut(&T) -> Option<T>,
    {
        let slot = self.slot.upgradable_read();
        let current: &T = &slot;

        match update(current) {
            Some(candidate) => {
                let candidate = Arc::new(candidate);
                let mut slot = RwLockUpgradableReadGuard::upgrade(slot);
                *slot = Arc::clone(&candidate);
                trace!("tree published under lock");
                candidate
            }
            None => Arc::clone(&slot),
        }
    }

    /// Unconditionally replaces the current version.
    pub fn store(&self, tree: T) {
        *self.slot.write() = Arc::new(tree);
    }
}

impl<T> PublishCell<T> for LockedTree<T> {
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

impl<T: Default> Default for LockedTree<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for LockedTree<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_tuple("LockedTree")
            .field(&*self.load())
            .finish()
    }
}
