//! Service registry keyed by arbitrary hashable keys.

use std::borrow::Borrow;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::sync::Arc;

use tracing::debug;

use super::RegistryError;
use crate::cell::{AtomicTree, update_slot};
use crate::tree::{DefaultHashBuilder, HashTree};

/// Maps service keys to factory entries.
///
/// Resolution reads the current [`HashTree`] without blocking. Registration
/// publishes a new version through the registry's [`AtomicTree`].
///
/// # Examples
///
/// ```rust
/// use std::any::TypeId;
/// use swaptree::registry::ServiceRegistry;
///
/// let registry: ServiceRegistry<TypeId, fn() -> String> = ServiceRegistry::new();
/// registry.register(TypeId::of::<String>(), || "hello".to_string());
///
/// let factory = registry.resolve(&TypeId::of::<String>()).unwrap();
/// assert_eq!(factory(), "hello");
/// ```
pub struct ServiceRegistry<K, F, S = DefaultHashBuilder> {
    registrations: AtomicTree<HashTree<K, F, S>>,
}

impl<K, F> ServiceRegistry<K, F, DefaultHashBuilder> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            registrations: AtomicTree::new(HashTree::empty()),
        }
    }
}

impl<K, F, S> ServiceRegistry<K, F, S> {
    /// Creates an empty registry hashing keys with `hash_builder`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::collections::hash_map::RandomState;
    /// use swaptree::registry::ServiceRegistry;
    ///
    /// let registry = ServiceRegistry::with_hasher(RandomState::new());
    /// registry.register("clock", 1);
    /// registry.register("clock", 2);
    /// assert_eq!(registry.resolve("clock"), Some(2));
    /// assert_eq!(registry.len(), 1);
    /// ```
    pub fn with_hasher(hash_builder: S) -> Self {
        Self {
            registrations: AtomicTree::new(HashTree::with_hasher(hash_builder)),
        }
    }

    /// Returns the current set of registrations as an immutable snapshot.
    pub fn snapshot(&self) -> Arc<HashTree<K, F, S>> {
        self.registrations.load()
    }

    /// Returns the number of registered keys.
    pub fn len(&self) -> usize {
        self.registrations.read(HashTree::len)
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registrations.read(HashTree::is_empty)
    }
}

impl<K, F, S> ServiceRegistry<K, F, S>
where
    K: Clone + Hash + Eq,
    F: Clone,
    S: BuildHasher + Clone,
{
    /// Registers `factory` under `key`, replacing any earlier registration.
    pub fn register(&self, key: K, factory: F) {
        let published = update_slot(&self.registrations, key, factory);
        debug!(registrations = published.len(), "service registered");
    }

    /// Registers `factory` under `key` only if `key` is not registered yet.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] if `key` already has a
    /// registration; the registry is left unchanged.
    pub fn register_unique(&self, key: K, factory: F) -> Result<(), RegistryError> {
        let mut rejected = false;

        self.registrations.publish(|current| {
            rejected = current.contains_key(&key);
            if rejected {
                None
            } else {
                Some(current.add_or_update(key.clone(), factory.clone()))
            }
        });

        if rejected {
            debug!("unique registration rejected");
            return Err(RegistryError::AlreadyRegistered);
        }
        debug!("unique service registered");
        Ok(())
    }

    /// Replaces the factory of an existing registration.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotRegistered`] if `key` has no registration;
    /// the registry is left unchanged.
    pub fn replace(&self, key: K, factory: F) -> Result<(), RegistryError> {
        let mut missing = false;

        self.registrations.publish(|current| {
            missing = !current.contains_key(&key);
            if missing {
                None
            } else {
                Some(current.update(key.clone(), factory.clone()))
            }
        });

        if missing {
            return Err(RegistryError::NotRegistered);
        }
        debug!("service registration replaced");
        Ok(())
    }

    /// Returns the factory registered under `key`.
    pub fn resolve<Q>(&self, key: &Q) -> Option<F>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.registrations.read(|tree| tree.try_get(key).cloned())
    }

    /// Returns `true` if `key` has a registration.
    pub fn is_registered<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.registrations.read(|tree| tree.contains_key(key))
    }

    /// Lists every registration in the current snapshot.
    pub fn registrations(&self) -> Vec<(K, F)> {
        self.registrations.read(|tree| {
            tree.iter()
                .map(|(key, factory)| (key.clone(), factory.clone()))
                .collect()
        })
    }
}

impl<K, F> Default for ServiceRegistry<K, F, DefaultHashBuilder> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: fmt::Debug, F: fmt::Debug, S> fmt::Debug for ServiceRegistry<K, F, S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ServiceRegistry")
            .field("registrations", &self.registrations)
            .finish()
    }
}
