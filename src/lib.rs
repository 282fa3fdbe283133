//! # swaptree
//!
//! Persistent AVL trees with lock-free publication, built to back the
//! service registry and singleton storage of a dependency-injection
//! container.
//!
//! ## Overview
//!
//! Containers resolve services constantly and register them rarely. This
//! crate serves that access pattern:
//!
//! - **Trees**: [`IntTree`](tree::IntTree), an immutable AVL tree keyed by
//!   `i32`, and [`HashTree`](tree::HashTree), which adapts it to any
//!   `Hash + Eq` key with collision chains
//! - **Cells**: [`AtomicTree`](cell::AtomicTree) holds the current tree and
//!   publishes new versions by compare-and-swap, so readers never block
//! - **Registry**: [`ServiceRegistry`](registry::ServiceRegistry) and
//!   [`SingletonScope`](registry::SingletonScope), the two consumers a
//!   container builds on top
//!
//! ## Feature Flags
//!
//! - `fxhash`: hash keys with `rustc-hash`
//! - `ahash`: hash keys with `ahash`
//! - `serde`: `Serialize`/`Deserialize` for `IntTree`
//!
//! ## Example
//!
//! ```rust
//! use swaptree::prelude::*;
//!
//! let cell = AtomicTree::new(IntTree::empty());
//! update_slot(&cell, 5, "a");
//!
//! let snapshot = cell.load();
//! assert_eq!(snapshot.get_or_default(5, &""), &"a");
//! assert_eq!(snapshot.try_get(6), None);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use swaptree::prelude::*;
/// ```
pub mod prelude {
    pub use crate::cell::*;
    pub use crate::registry::*;
    pub use crate::tree::*;
}

pub mod cell;
pub mod registry;
pub mod tree;
