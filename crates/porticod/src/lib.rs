//! Bootstrapper for the Portico proxy processes.
//!
//! A proxy process serves either public queue traffic or administrative
//! traffic. Given that [`AccessMode`] and a [`ConfigSource`], [`Bootstrap`]
//! loads configuration through [`portico_config`], installs structured
//! telemetry and then wires three drivers on demand:
//!
//! - storage, looked up as the configured name in [`STORAGE_NAMESPACE`];
//! - cache, produced by a [`CacheProvisioner`] from the whole configuration;
//! - transport, looked up in the access mode's transport namespace and
//!   handed the storage and cache handles.
//!
//! Every driver is constructed at most once, including under concurrent first
//! access, and only when something asks for it. Registry and provisioner
//! failures surface uniformly as [`InvalidDriver`] after being reported at
//! error level through the [`HealthReporter`].
//!
//! [`Bootstrap::run`] wires everything and blocks in the transport's
//! `listen`; the `porticod` and `porticod-admin` binaries are thin wrappers
//! around [`run_proxy`].

mod access;
mod bootstrap;
mod builtin;
mod cache;
mod drivers;
mod health;
mod lazy;
mod process;
mod registry;
mod storage;
mod telemetry;
mod transport;

pub use access::{AccessMode, TransportNamespace, UnknownAccessMode};
pub use bootstrap::{
    Bootstrap, BootstrapError, Collaborators, ConfigLoader, ConfigSource, RunError,
    StaticConfigLoader, SystemConfigLoader,
};
pub use cache::{CacheProvisioner, ConfiguredCacheProvisioner, MemoryCache};
pub use drivers::{
    CacheDriver, CacheHandle, DriverKind, DriverKindParseError, InvalidDriver, StorageDriver,
    StorageHandle, TransportDriver, TransportError, TransportHandle,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use process::{ProcessError, run_proxy, run_proxy_with};
pub use registry::{
    DriverError, DriverRegistry, STORAGE_NAMESPACE, StaticDriverRegistry, TransportContext,
};
pub use storage::{MEMORY_STORAGE_DRIVER, MemoryStorage};
pub use telemetry::{SUBSYSTEM, TelemetryError};
pub use transport::{
    Disarm, GATEWAY_DRIVER, GatewayTransport, ListenerError, OccupiedBy, ShutdownCause,
    ShutdownError, ShutdownSignal, ShutdownTrigger, SystemShutdownSignal,
};

#[cfg(test)]
mod tests;
