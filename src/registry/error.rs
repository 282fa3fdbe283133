use std::fmt;

/// Error returned by the registration policies of
/// [`ServiceRegistry`](super::ServiceRegistry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryError {
    /// [`register_unique`](super::ServiceRegistry::register_unique) found the
    /// key already registered.
    AlreadyRegistered,
    /// [`replace`](super::ServiceRegistry::replace) found no registration to
    /// replace.
    NotRegistered,
}

impl fmt::Display for RegistryError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyRegistered => write!(formatter, "service is already registered"),
            Self::NotRegistered => write!(formatter, "service is not registered"),
        }
    }
}

impl std::error::Error for RegistryError {}
