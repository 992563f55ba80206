//! Name-keyed driver registry.
//!
//! Drivers are looked up by `(namespace, name)`. Storage drivers live in
//! [`STORAGE_NAMESPACE`]; transport drivers live in the namespace derived from
//! the process access mode (see [`crate::AccessMode::transport_namespace`]).
//! [`StaticDriverRegistry`] is a static name table populated at startup;
//! anything implementing [`DriverRegistry`] can stand in for it.

mod error;

use std::collections::HashMap;
use std::fmt;

use portico_config::Config;

use crate::access::AccessMode;
use crate::drivers::{CacheHandle, StorageHandle, TransportHandle};

pub use self::error::DriverError;

/// Namespace holding storage drivers.
pub const STORAGE_NAMESPACE: &str = "proxy.storage";

/// Constructor inputs handed to a transport driver.
#[derive(Debug, Clone)]
pub struct TransportContext<'a> {
    /// Resolved process configuration.
    pub config: &'a Config,
    /// Access mode the transport serves.
    pub access_mode: AccessMode,
    /// Storage driver constructed for this process.
    pub storage: StorageHandle,
    /// Cache driver constructed for this process.
    pub cache: CacheHandle,
}

/// Resolves driver names to constructed drivers.
pub trait DriverRegistry: Send + Sync {
    /// Constructs the storage driver registered as `name` in `namespace`.
    fn resolve_storage(
        &self,
        namespace: &str,
        name: &str,
        config: &Config,
    ) -> Result<StorageHandle, DriverError>;

    /// Constructs the transport driver registered as `name` in `namespace`.
    fn resolve_transport(
        &self,
        namespace: &str,
        name: &str,
        context: TransportContext<'_>,
    ) -> Result<TransportHandle, DriverError>;
}

type StorageFactory = Box<dyn Fn(&Config) -> Result<StorageHandle, DriverError> + Send + Sync>;
type TransportFactory =
    Box<dyn Fn(TransportContext<'_>) -> Result<TransportHandle, DriverError> + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DriverKey {
    namespace: String,
    name: String,
}

impl DriverKey {
    fn new(namespace: &str, name: &str) -> Self {
        Self {
            namespace: namespace.to_owned(),
            name: name.to_owned(),
        }
    }
}

/// Registry backed by factories registered at startup.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use porticod::{MemoryStorage, STORAGE_NAMESPACE, StaticDriverRegistry, StorageHandle};
///
/// let mut registry = StaticDriverRegistry::new();
/// registry
///     .register_storage(STORAGE_NAMESPACE, "memory", |_config| {
///         Ok(Arc::new(MemoryStorage::new()) as StorageHandle)
///     })
///     .expect("registration succeeds");
/// assert!(registry.contains(STORAGE_NAMESPACE, "memory"));
/// ```
#[derive(Default)]
pub struct StaticDriverRegistry {
    storage: HashMap<DriverKey, StorageFactory>,
    transport: HashMap<DriverKey, TransportFactory>,
}

impl fmt::Debug for StaticDriverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut storage: Vec<_> = self.storage.keys().collect();
        storage.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));
        let mut transport: Vec<_> = self.transport.keys().collect();
        transport.sort_by(|a, b| (&a.namespace, &a.name).cmp(&(&b.namespace, &b.name)));
        f.debug_struct("StaticDriverRegistry")
            .field("storage", &storage)
            .field("transport", &transport)
            .finish()
    }
}

impl StaticDriverRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a storage driver factory.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Duplicate`] when the name is already taken in
    /// `namespace` by any driver.
    pub fn register_storage<F>(
        &mut self,
        namespace: &str,
        name: &str,
        factory: F,
    ) -> Result<(), DriverError>
    where
        F: Fn(&Config) -> Result<StorageHandle, DriverError> + Send + Sync + 'static,
    {
        let key = self.vacant_key(namespace, name)?;
        self.storage.insert(key, Box::new(factory));
        Ok(())
    }

    /// Registers a transport driver factory.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Duplicate`] when the name is already taken in
    /// `namespace` by any driver.
    pub fn register_transport<F>(
        &mut self,
        namespace: &str,
        name: &str,
        factory: F,
    ) -> Result<(), DriverError>
    where
        F: Fn(TransportContext<'_>) -> Result<TransportHandle, DriverError>
            + Send
            + Sync
            + 'static,
    {
        let key = self.vacant_key(namespace, name)?;
        self.transport.insert(key, Box::new(factory));
        Ok(())
    }

    /// Returns `true` when a driver is registered as `name` in `namespace`.
    #[must_use]
    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        let key = DriverKey::new(namespace, name);
        self.storage.contains_key(&key) || self.transport.contains_key(&key)
    }

    /// Sorted driver names registered in `namespace`.
    #[must_use]
    pub fn names(&self, namespace: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .storage
            .keys()
            .chain(self.transport.keys())
            .filter(|key| key.namespace == namespace)
            .map(|key| key.name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    fn vacant_key(&self, namespace: &str, name: &str) -> Result<DriverKey, DriverError> {
        if self.contains(namespace, name) {
            return Err(DriverError::Duplicate {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
            });
        }
        Ok(DriverKey::new(namespace, name))
    }
}

fn not_found(namespace: &str, name: &str) -> DriverError {
    DriverError::NotFound {
        namespace: namespace.to_owned(),
        name: name.to_owned(),
    }
}

impl DriverRegistry for StaticDriverRegistry {
    fn resolve_storage(
        &self,
        namespace: &str,
        name: &str,
        config: &Config,
    ) -> Result<StorageHandle, DriverError> {
        let factory = self
            .storage
            .get(&DriverKey::new(namespace, name))
            .ok_or_else(|| not_found(namespace, name))?;
        factory(config)
    }

    fn resolve_transport(
        &self,
        namespace: &str,
        name: &str,
        context: TransportContext<'_>,
    ) -> Result<TransportHandle, DriverError> {
        let factory = self
            .transport
            .get(&DriverKey::new(namespace, name))
            .ok_or_else(|| not_found(namespace, name))?;
        factory(context)
    }
}
