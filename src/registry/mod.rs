//! Registry and scope storage built on the trees and cells.
//!
//! These are the shapes a dependency-injection container consumes:
//!
//! - [`ServiceRegistry`]: service key to factory, hashed keys
//! - [`SingletonScope`]: singleton id to cached instance, integer keys
//!
//! Both read without locks and publish writes through an
//! [`AtomicTree`](crate::cell::AtomicTree). Factory selection, decoration
//! and scope lifetimes belong to the container, not to this module.

mod error;
mod scope;
mod services;

pub use error::RegistryError;
pub use scope::SingletonScope;
pub use services::ServiceRegistry;

static_assertions::assert_impl_all!(ServiceRegistry<std::any::TypeId, fn() -> u32>: Send, Sync);
static_assertions::assert_impl_all!(SingletonScope<String>: Send, Sync);
static_assertions::assert_impl_all!(RegistryError: std::error::Error, Send, Sync);
