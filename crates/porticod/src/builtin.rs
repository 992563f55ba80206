//! Name table of the drivers shipped with the proxy.

use std::sync::Arc;

use tracing::debug;

use crate::access::AccessMode;
use crate::drivers::{StorageHandle, TransportHandle};
use crate::registry::{DriverError, STORAGE_NAMESPACE, StaticDriverRegistry};
use crate::storage::{MEMORY_STORAGE_DRIVER, MemoryStorage};
use crate::transport::{GATEWAY_DRIVER, GatewayTransport};

const BUILTIN_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::builtin");

/// Registry holding the memory storage and the gateway for every access mode.
pub(crate) fn registry() -> Result<StaticDriverRegistry, DriverError> {
    let mut registry = StaticDriverRegistry::new();
    registry.register_storage(STORAGE_NAMESPACE, MEMORY_STORAGE_DRIVER, |_config| {
        Ok(Arc::new(MemoryStorage::new()) as StorageHandle)
    })?;
    for mode in AccessMode::ALL {
        registry.register_transport(
            mode.transport_namespace().as_str(),
            GATEWAY_DRIVER,
            |context| Ok(Arc::new(GatewayTransport::from_context(context)?) as TransportHandle),
        )?;
    }
    let namespaces = AccessMode::ALL.map(|mode| mode.transport_namespace());
    for namespace in namespaces.iter().map(|ns| ns.as_str()).chain([STORAGE_NAMESPACE]) {
        debug!(
            target: BUILTIN_TARGET,
            namespace,
            drivers = ?registry.names(namespace),
            "built-in drivers registered"
        );
    }
    Ok(registry)
}
