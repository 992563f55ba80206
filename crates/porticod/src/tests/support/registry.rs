//! Recording registry and cache provisioner: log lookups, hand out drivers
//! that log their shutdowns, and support injected failures.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use portico_config::Config;

use crate::cache::CacheProvisioner;
use crate::drivers::{
    CacheDriver, CacheHandle, DriverKind, StorageDriver, StorageHandle, TransportDriver,
    TransportError, TransportHandle,
};
use crate::registry::{DriverError, DriverRegistry, TransportContext};

type ShutdownLog = Arc<Mutex<Vec<DriverKind>>>;

fn log_shutdown(log: &ShutdownLog, kind: DriverKind) {
    log.lock().expect("shutdown log mutex poisoned").push(kind);
}

/// Registry that knows `memory` storage and `wsgi` transports in every
/// namespace.
#[derive(Clone)]
pub struct RecordingDriverRegistry {
    state: Arc<Mutex<RegistryState>>,
    shutdowns: ShutdownLog,
    listens: Arc<AtomicUsize>,
}

impl Default for RecordingDriverRegistry {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
            shutdowns: Arc::new(Mutex::new(Vec::new())),
            listens: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl RecordingDriverRegistry {
    /// Makes construction of `kind` fail with `message`.
    pub fn fail_on(&self, kind: DriverKind, message: impl Into<String>) {
        let mut state = self.state.lock().expect("registry state mutex poisoned");
        state.failures.insert(kind, message.into());
    }

    /// Makes the transport's `listen` fail with `message`.
    pub fn fail_listen(&self, message: impl Into<String>) {
        let mut state = self.state.lock().expect("registry state mutex poisoned");
        state.listen_failure = Some(message.into());
    }

    /// Every `(namespace, name)` looked up, in order.
    #[must_use]
    pub fn lookups(&self) -> Vec<(String, String)> {
        let state = self.state.lock().expect("registry state mutex poisoned");
        state.lookups.clone()
    }

    /// Driver kinds looked up, in order.
    #[must_use]
    pub fn resolved_kinds(&self) -> Vec<DriverKind> {
        let state = self.state.lock().expect("registry state mutex poisoned");
        state.kinds.clone()
    }

    /// Storage and cache handles passed to each constructed transport.
    #[must_use]
    pub fn transport_inputs(&self) -> Vec<(StorageHandle, CacheHandle)> {
        let state = self.state.lock().expect("registry state mutex poisoned");
        state.transport_inputs.clone()
    }

    /// Drivers shut down so far, in order.
    #[must_use]
    pub fn shutdowns(&self) -> Vec<DriverKind> {
        self.shutdowns
            .lock()
            .expect("shutdown log mutex poisoned")
            .clone()
    }

    /// Number of `listen` calls across all transports handed out.
    #[must_use]
    pub fn listen_count(&self) -> usize {
        self.listens.load(Ordering::SeqCst)
    }

    /// Shutdown log shared with drivers from other collaborators.
    pub(crate) fn shutdown_log(&self) -> ShutdownLog {
        Arc::clone(&self.shutdowns)
    }

    fn record(&self, kind: DriverKind, namespace: &str, name: &str) -> Option<String> {
        let mut state = self.state.lock().expect("registry state mutex poisoned");
        state.kinds.push(kind);
        state.lookups.push((namespace.to_owned(), name.to_owned()));
        state.failures.get(&kind).cloned()
    }
}

impl DriverRegistry for RecordingDriverRegistry {
    fn resolve_storage(
        &self,
        namespace: &str,
        name: &str,
        _config: &Config,
    ) -> Result<StorageHandle, DriverError> {
        if let Some(message) = self.record(DriverKind::Storage, namespace, name) {
            return Err(DriverError::construction(namespace, name, message));
        }
        if name != "memory" {
            return Err(DriverError::NotFound {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
            });
        }
        Ok(Arc::new(RecordingStorage {
            shutdowns: self.shutdown_log(),
        }))
    }

    fn resolve_transport(
        &self,
        namespace: &str,
        name: &str,
        context: TransportContext<'_>,
    ) -> Result<TransportHandle, DriverError> {
        if let Some(message) = self.record(DriverKind::Transport, namespace, name) {
            return Err(DriverError::construction(namespace, name, message));
        }
        if name != "wsgi" {
            return Err(DriverError::NotFound {
                namespace: namespace.to_owned(),
                name: name.to_owned(),
            });
        }
        let mut state = self.state.lock().expect("registry state mutex poisoned");
        state
            .transport_inputs
            .push((Arc::clone(&context.storage), Arc::clone(&context.cache)));
        Ok(Arc::new(RecordingTransport {
            listens: Arc::clone(&self.listens),
            failure: state.listen_failure.clone(),
            shutdowns: self.shutdown_log(),
        }))
    }
}

#[derive(Default)]
struct RegistryState {
    kinds: Vec<DriverKind>,
    lookups: Vec<(String, String)>,
    failures: HashMap<DriverKind, String>,
    listen_failure: Option<String>,
    transport_inputs: Vec<(StorageHandle, CacheHandle)>,
}

/// Cache provisioner that counts calls and supports an injected failure.
#[derive(Clone)]
pub struct RecordingCacheProvisioner {
    calls: Arc<AtomicUsize>,
    failure: Arc<Mutex<Option<String>>>,
    shutdowns: ShutdownLog,
}

impl RecordingCacheProvisioner {
    /// Provisioner whose caches log shutdowns into `registry`'s log.
    #[must_use]
    pub fn sharing_log_with(registry: &RecordingDriverRegistry) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            failure: Arc::new(Mutex::new(None)),
            shutdowns: registry.shutdown_log(),
        }
    }

    /// Makes every provisioning request fail with an unsupported scheme.
    pub fn fail_with_scheme(&self, scheme: impl Into<String>) {
        *self.failure.lock().expect("provisioner mutex poisoned") = Some(scheme.into());
    }

    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl CacheProvisioner for RecordingCacheProvisioner {
    fn get_cache(&self, config: &Config) -> Result<CacheHandle, DriverError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let failure = self
            .failure
            .lock()
            .expect("provisioner mutex poisoned")
            .clone();
        if let Some(scheme) = failure {
            return Err(DriverError::UnsupportedCache {
                url: config.cache_url().to_owned(),
                scheme,
            });
        }
        Ok(Arc::new(RecordingCache {
            shutdowns: Arc::clone(&self.shutdowns),
        }))
    }
}

#[derive(Debug)]
struct RecordingStorage {
    shutdowns: ShutdownLog,
}

impl StorageDriver for RecordingStorage {
    fn name(&self) -> &str {
        "memory"
    }

    fn shutdown(&self) {
        log_shutdown(&self.shutdowns, DriverKind::Storage);
    }
}

#[derive(Debug)]
struct RecordingCache {
    shutdowns: ShutdownLog,
}

impl CacheDriver for RecordingCache {
    fn backend(&self) -> &str {
        "recording"
    }

    fn get(&self, _key: &str) -> Option<Vec<u8>> {
        None
    }

    fn set(&self, _key: &str, _value: Vec<u8>) {}

    fn unset(&self, _key: &str) -> bool {
        false
    }

    fn shutdown(&self) {
        log_shutdown(&self.shutdowns, DriverKind::Cache);
    }
}

#[derive(Debug)]
struct RecordingTransport {
    listens: Arc<AtomicUsize>,
    failure: Option<String>,
    shutdowns: ShutdownLog,
}

impl TransportDriver for RecordingTransport {
    fn listen(&self) -> Result<(), TransportError> {
        self.listens.fetch_add(1, Ordering::SeqCst);
        match &self.failure {
            Some(message) => Err(TransportError::new(message.clone())),
            None => Ok(()),
        }
    }

    fn shutdown(&self) {
        log_shutdown(&self.shutdowns, DriverKind::Transport);
    }
}
