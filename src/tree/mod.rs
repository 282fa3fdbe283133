//! Persistent (immutable) trees.
//!
//! - [`IntTree`]: AVL tree keyed by `i32`
//! - [`HashTree`]: map for any `Hash + Eq` key, built on `IntTree`
//!
//! Both are fully immutable. Every write returns a new version that shares
//! all unaffected nodes with the previous one, and nodes are held by
//! `Arc`, so any version can be read from any thread at any time.
//!
//! # Examples
//!
//! ```rust
//! use swaptree::tree::{HashTree, IntTree};
//!
//! let singletons = IntTree::empty().add_or_update(0, "first instance");
//! assert_eq!(singletons.try_get(0), Some(&"first instance"));
//!
//! let services = HashTree::empty().add_or_update("db", "postgres factory");
//! assert_eq!(services.get_or_default("cache", &"none"), &"none");
//! ```

mod hash_tree;
mod int_tree;
mod invariant;
mod node;

pub use hash_tree::HashTree;
pub use hash_tree::HashTreeIntoIterator;
pub use hash_tree::HashTreeIterator;
pub use int_tree::IntTree;
pub use int_tree::IntTreeIntoIterator;
pub use int_tree::IntTreeIterator;
pub use invariant::InvariantError;

// =============================================================================
// Hasher Selection
// =============================================================================

/// Hasher used by [`HashTree`] when none is specified.
///
/// Selected by cargo feature: `fxhash` picks `rustc-hash`, `ahash` picks
/// `ahash`, otherwise std's SipHash with fixed keys. Any other
/// [`BuildHasher`](std::hash::BuildHasher) can be passed to
/// [`HashTree::with_hasher`].
#[cfg(feature = "fxhash")]
pub type DefaultHashBuilder = rustc_hash::FxBuildHasher;

/// Hasher used by [`HashTree`] when none is specified.
#[cfg(all(feature = "ahash", not(feature = "fxhash")))]
pub type DefaultHashBuilder = std::hash::BuildHasherDefault<ahash::AHasher>;

/// Hasher used by [`HashTree`] when none is specified.
#[cfg(not(any(feature = "fxhash", feature = "ahash")))]
pub type DefaultHashBuilder = std::hash::BuildHasherDefault<std::hash::DefaultHasher>;

#[cfg(feature = "fxhash")]
pub(crate) const fn default_hash_builder() -> DefaultHashBuilder {
    rustc_hash::FxBuildHasher
}

#[cfg(not(feature = "fxhash"))]
pub(crate) const fn default_hash_builder() -> DefaultHashBuilder {
    std::hash::BuildHasherDefault::new()
}

// =============================================================================
// PersistentTree
// =============================================================================

/// The write shape shared by the tree types: produce a new version with one
/// key inserted or replaced.
///
/// This is what [`update_slot`](crate::cell::update_slot) needs to retry a
/// write against whichever version is current.
pub trait PersistentTree: Sized {
    /// Key type accepted by [`add_or_update`](Self::add_or_update).
    type Key;
    /// Stored value type.
    type Value;

    /// Returns a new version with `key` mapped to `value`.
    #[must_use]
    fn add_or_update(&self, key: Self::Key, value: Self::Value) -> Self;
}

static_assertions::assert_impl_all!(IntTree<String>: Send, Sync);
static_assertions::assert_impl_all!(HashTree<String, String>: Send, Sync);
static_assertions::assert_impl_all!(InvariantError: std::error::Error, Send, Sync);
