//! Shared cells holding the current version of a persistent tree.
//!
//! A registry or scope keeps exactly one mutable value: the pointer to its
//! current tree. These cells manage that pointer.
//!
//! - [`AtomicTree`]: compare-and-swap publication, readers never wait
//! - [`LockedTree`]: the same contract with writers serialized by a lock
//!
//! Writers go through [`PublishCell::publish`], or through [`update_slot`]
//! for the common "insert or replace one key" write:
//!
//! ```text
//! loop:
//!   snapshot  = load(cell)
//!   candidate = snapshot.add_or_update(key, value)
//!   if compare_and_swap(cell, expected = snapshot, new = candidate):
//!       return
//! ```
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use swaptree::cell::{AtomicTree, update_slot};
//! use swaptree::tree::IntTree;
//!
//! let cell = Arc::new(AtomicTree::new(IntTree::empty()));
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|key| {
//!         let cell = Arc::clone(&cell);
//!         thread::spawn(move || update_slot(&*cell, key, key * 10))
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(cell.load().len(), 4);
//! ```

mod atomic;
mod locked;

use std::sync::Arc;

use crate::tree::PersistentTree;

pub use atomic::AtomicTree;
pub use locked::LockedTree;

/// A cell publishing successive immutable versions of a `T`.
pub trait PublishCell<T> {
    /// Returns the current version.
    fn load(&self) -> Arc<T>;

    /// Publishes the version `update` derives from the current one, or
    /// leaves the cell untouched if `update` returns `None`.
    ///
    /// Returns the version that is current once this call has taken
    /// effect. `update` may be called more than once and must not depend
    /// on anything but its argument and its captures.
    fn publish<F>(&self, update: F) -> Arc<T>
    where
        F: FnMut(&T) -> Option<T>;

    /// Unconditionally replaces the current version.
    fn store(&self, tree: T);
}

/// Maps `key` to `value` in the tree held by `cell`, retrying until the
/// write is published.
///
/// Returns the version containing the write. Concurrent calls with
/// different keys are all reflected in the final version.
pub fn update_slot<C, T>(cell: &C, key: T::Key, value: T::Value) -> Arc<T>
where
    C: PublishCell<T> + ?Sized,
    T: PersistentTree,
    T::Key: Clone,
    T::Value: Clone,
{
    cell.publish(|snapshot| Some(snapshot.add_or_update(key.clone(), value.clone())))
}

static_assertions::assert_impl_all!(AtomicTree<crate::tree::IntTree<String>>: Send, Sync);
static_assertions::assert_impl_all!(LockedTree<crate::tree::IntTree<String>>: Send, Sync);
