//! Proxy bootstrap orchestration.
//!
//! [`Bootstrap`] loads configuration, initialises telemetry and then wires the
//! storage, cache and transport drivers on demand. Each driver is resolved at
//! most once; the transport receives the storage and cache handles as
//! constructor inputs, so asking for it resolves them first.

use std::borrow::Cow;
use std::ffi::OsString;
use std::io;
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use camino::Utf8PathBuf;
use ortho_config::declarative::LayerComposition;
use ortho_config::serde_json::Value;
use ortho_config::{MergeLayer, MergeProvenance, OrthoError, OrthoMergeExt};
use thiserror::Error;

use portico_config::Config;

use crate::access::{AccessMode, TransportNamespace, UnknownAccessMode};
use crate::builtin;
use crate::cache::{CacheProvisioner, ConfiguredCacheProvisioner};
use crate::drivers::{
    CacheHandle, DriverKind, InvalidDriver, StorageHandle, TransportError, TransportHandle,
};
use crate::health::{HealthReporter, StructuredHealthReporter};
use crate::lazy::DriverSlot;
use crate::registry::{DriverError, DriverRegistry, STORAGE_NAMESPACE, TransportContext};
use crate::telemetry::{self, TelemetryError};

const DEFAULT_PROGRAM: &str = "porticod";

/// Where configuration comes from: configuration files plus CLI arguments.
///
/// Environment variables are always consulted by the loader; an empty source
/// means "defaults and environment only". Configuration files are listed in
/// increasing precedence and every one of them must exist. Each file is a
/// separate layer, so a later file overrides only the keys it sets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSource {
    program: OsString,
    config_files: Vec<PathBuf>,
    cli_args: Vec<OsString>,
}

impl Default for ConfigSource {
    fn default() -> Self {
        Self {
            program: OsString::from(DEFAULT_PROGRAM),
            config_files: Vec::new(),
            cli_args: Vec::new(),
        }
    }
}

impl ConfigSource {
    /// Source with no files and no CLI arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Source built from the current process arguments.
    #[must_use]
    pub fn from_env() -> Self {
        let mut args = std::env::args_os();
        let program = args
            .next()
            .unwrap_or_else(|| OsString::from(DEFAULT_PROGRAM));
        Self {
            program,
            config_files: Vec::new(),
            cli_args: args.collect(),
        }
    }

    /// Adds a configuration file after those already listed.
    #[must_use]
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_files.push(path.into());
        self
    }

    /// Appends command-line arguments, in order.
    #[must_use]
    pub fn with_cli_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.cli_args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Configuration files, lowest precedence first.
    #[must_use]
    pub fn config_files(&self) -> &[PathBuf] {
        &self.config_files
    }

    /// Argument vector handed to the command-line parser.
    #[must_use]
    pub fn arguments(&self) -> Vec<OsString> {
        let mut arguments = Vec::with_capacity(self.cli_args.len() + 1);
        arguments.push(self.program.clone());
        arguments.extend(self.cli_args.iter().cloned());
        arguments
    }

    /// Reads every listed file into a merge layer, in order.
    fn file_layers(&self) -> Result<Vec<MergeLayer<'static>>, Arc<OrthoError>> {
        self.config_files
            .iter()
            .map(|path| file_layer(path))
            .collect()
    }
}

fn file_layer(path: &Path) -> Result<MergeLayer<'static>, Arc<OrthoError>> {
    let figment = ortho_config::load_config_file(path)?.ok_or_else(|| {
        Arc::new(OrthoError::File {
            path: path.to_path_buf(),
            source: Box::new(io::Error::new(
                io::ErrorKind::NotFound,
                "configuration file not found",
            )),
        })
    })?;
    let value = figment.extract::<Value>().into_ortho_merge()?;
    let origin = Utf8PathBuf::from_path_buf(path.to_path_buf()).ok();
    Ok(MergeLayer::file(Cow::Owned(value), origin))
}

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the proxy configuration from `source`.
    fn load(&self, source: &ConfigSource) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that layers defaults, files, environment and CLI via `ortho_config`.
///
/// The listed files sit above any file `ortho_config` discovers on its own
/// and below the environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self, source: &ConfigSource) -> Result<Config, Arc<OrthoError>> {
        let files = source.file_layers()?;
        let (mut layers, errors) =
            Config::compose_layers_from_iter(source.arguments()).into_parts();
        let above_files = layers
            .iter()
            .position(|layer| {
                matches!(
                    layer.provenance(),
                    MergeProvenance::Environment | MergeProvenance::Cli
                )
            })
            .unwrap_or(layers.len());
        layers.splice(above_files..above_files, files);
        LayerComposition::new(layers, errors).into_merge_result(Config::merge_from_layers)
    }
}

/// Loader that returns a fixed configuration, ignoring the source.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps a ready configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, _source: &ConfigSource) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// External collaborators the bootstrapper resolves drivers through.
#[derive(Clone)]
pub struct Collaborators {
    /// Registry for storage and transport drivers.
    pub registry: Arc<dyn DriverRegistry>,
    /// Source of the cache driver.
    pub cache_provisioner: Arc<dyn CacheProvisioner>,
    /// Sink for lifecycle events.
    pub reporter: Arc<dyn HealthReporter>,
}

impl Collaborators {
    /// Built-in drivers, the configured cache provisioner and `tracing` reporting.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] if the built-in name table is inconsistent.
    pub fn builtin() -> Result<Self, DriverError> {
        Ok(Self {
            registry: Arc::new(builtin::registry()?),
            cache_provisioner: Arc::new(ConfiguredCacheProvisioner),
            reporter: Arc::new(StructuredHealthReporter::new()),
        })
    }
}

/// Errors surfaced while constructing a [`Bootstrap`].
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The access mode label was not recognised.
    #[error(transparent)]
    UnknownAccessMode(#[from] UnknownAccessMode),
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Errors surfaced by [`Bootstrap::run`].
#[derive(Debug, Error)]
pub enum RunError {
    /// A driver needed by the transport could not be loaded.
    #[error(transparent)]
    Driver(#[from] InvalidDriver),
    /// The transport stopped with an error.
    #[error(transparent)]
    Transport(TransportError),
    /// `run` was already invoked on this bootstrapper.
    #[error("the proxy is already running")]
    AlreadyRunning,
}

/// Wires and starts the drivers of one proxy process.
pub struct Bootstrap {
    access_mode: AccessMode,
    transport_namespace: TransportNamespace,
    config: Config,
    registry: Arc<dyn DriverRegistry>,
    cache_provisioner: Arc<dyn CacheProvisioner>,
    reporter: Arc<dyn HealthReporter>,
    storage: DriverSlot<StorageHandle>,
    cache: DriverSlot<CacheHandle>,
    transport: DriverSlot<TransportHandle>,
    constructed: Mutex<Vec<DriverKind>>,
    live: Mutex<Vec<DriverKind>>,
    running: AtomicBool,
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("access_mode", &self.access_mode)
            .field("transport_namespace", &self.transport_namespace)
            .field("config", &self.config)
            .field("constructed", &self.constructed_kinds())
            .finish_non_exhaustive()
    }
}

impl Bootstrap {
    /// Loads configuration and telemetry for `access_mode`.
    ///
    /// No driver is constructed here.
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::Configuration`] or
    /// [`BootstrapError::Telemetry`] carrying the collaborator's error.
    pub fn new(
        access_mode: AccessMode,
        source: &ConfigSource,
        loader: &dyn ConfigLoader,
        collaborators: Collaborators,
    ) -> Result<Self, BootstrapError> {
        let Collaborators {
            registry,
            cache_provisioner,
            reporter,
        } = collaborators;
        reporter.bootstrap_starting(access_mode);

        let config = match loader.load(source) {
            Ok(config) => config,
            Err(source) => {
                let error = BootstrapError::Configuration { source };
                reporter.bootstrap_failed(&error);
                return Err(error);
            }
        };

        if let Err(source) = telemetry::initialise(&config) {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }

        let transport_namespace = access_mode.transport_namespace();
        reporter.bootstrap_succeeded(&config, &transport_namespace);

        Ok(Self {
            access_mode,
            transport_namespace,
            config,
            registry,
            cache_provisioner,
            reporter,
            storage: DriverSlot::new(DriverKind::Storage),
            cache: DriverSlot::new(DriverKind::Cache),
            transport: DriverSlot::new(DriverKind::Transport),
            constructed: Mutex::new(Vec::new()),
            live: Mutex::new(Vec::new()),
            running: AtomicBool::new(false),
        })
    }

    /// Parses an access mode label, then behaves like [`Bootstrap::new`].
    ///
    /// # Errors
    ///
    /// Returns [`BootstrapError::UnknownAccessMode`] before any collaborator
    /// is consulted when `label` is not an access mode.
    pub fn from_mode_label(
        label: &str,
        source: &ConfigSource,
        loader: &dyn ConfigLoader,
        collaborators: Collaborators,
    ) -> Result<Self, BootstrapError> {
        let access_mode = label.parse::<AccessMode>()?;
        Self::new(access_mode, source, loader, collaborators)
    }

    /// Access mode fixed at construction.
    #[must_use]
    pub fn access_mode(&self) -> AccessMode {
        self.access_mode
    }

    /// Registry namespace searched for the transport driver.
    #[must_use]
    pub fn transport_namespace(&self) -> &TransportNamespace {
        &self.transport_namespace
    }

    /// Resolved configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Storage driver, resolved on first call.
    ///
    /// # Errors
    ///
    /// Returns the memoised [`InvalidDriver`] if resolution failed.
    pub fn storage(&self) -> Result<StorageHandle, InvalidDriver> {
        self.storage.get_or_resolve(|| {
            self.construct(&self.storage, || {
                self.registry.resolve_storage(
                    STORAGE_NAMESPACE,
                    self.config.drivers().storage,
                    &self.config,
                )
            })
        })
    }

    /// Cache driver, provisioned on first call.
    ///
    /// # Errors
    ///
    /// Returns the memoised [`InvalidDriver`] if provisioning failed.
    pub fn cache(&self) -> Result<CacheHandle, InvalidDriver> {
        self.cache.get_or_resolve(|| {
            self.construct(&self.cache, || {
                self.cache_provisioner.get_cache(&self.config)
            })
        })
    }

    /// Transport driver, resolved on first call after storage and cache.
    ///
    /// # Errors
    ///
    /// Returns the storage or cache failure when a dependency cannot be
    /// loaded (the transport is then never looked up), or the transport's own
    /// [`InvalidDriver`].
    pub fn transport(&self) -> Result<TransportHandle, InvalidDriver> {
        self.transport.get_or_resolve(|| {
            let storage = self.storage()?;
            let cache = self.cache()?;
            self.construct(&self.transport, || {
                let context = TransportContext {
                    config: &self.config,
                    access_mode: self.access_mode,
                    storage,
                    cache,
                };
                self.registry.resolve_transport(
                    self.transport_namespace.as_str(),
                    self.config.drivers().transport,
                    context,
                )
            })
        })
    }

    /// Wires every driver and hands control to the transport.
    ///
    /// Blocks until the transport's `listen` returns, then shuts the drivers
    /// down. A wiring failure also shuts down whatever was constructed.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Driver`] when wiring fails,
    /// [`RunError::Transport`] when listening fails and
    /// [`RunError::AlreadyRunning`] on a second call.
    pub fn run(&self) -> Result<(), RunError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(RunError::AlreadyRunning);
        }
        let transport = match self.transport() {
            Ok(transport) => transport,
            Err(error) => {
                self.shutdown();
                return Err(RunError::Driver(error));
            }
        };
        self.reporter.transport_listening(self.access_mode);
        let outcome = transport.listen().map_err(RunError::Transport);
        self.shutdown();
        outcome
    }

    /// Shuts constructed drivers down in reverse construction order.
    ///
    /// Drivers that were never constructed are left alone, and each driver is
    /// stopped at most once. A driver constructed after an earlier call is
    /// stopped by the next one.
    pub fn shutdown(&self) {
        let pending = mem::take(&mut *self.live.lock().unwrap_or_else(PoisonError::into_inner));
        for kind in pending.into_iter().rev() {
            match kind {
                DriverKind::Storage => {
                    if let Some(storage) = self.storage.constructed() {
                        storage.shutdown();
                    }
                }
                DriverKind::Cache => {
                    if let Some(cache) = self.cache.constructed() {
                        cache.shutdown();
                    }
                }
                DriverKind::Transport => {
                    if let Some(transport) = self.transport.constructed() {
                        transport.shutdown();
                    }
                }
            }
            self.reporter.driver_stopped(kind);
        }
    }

    /// Returns `true` once the slot for `kind` has been resolved, whether or
    /// not resolution succeeded.
    #[must_use]
    pub fn is_resolved(&self, kind: DriverKind) -> bool {
        match kind {
            DriverKind::Storage => self.storage.is_resolved(),
            DriverKind::Cache => self.cache.is_resolved(),
            DriverKind::Transport => self.transport.is_resolved(),
        }
    }

    /// Driver kinds constructed so far, in construction order.
    #[must_use]
    pub fn constructed_kinds(&self) -> Vec<DriverKind> {
        self.constructed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn construct<T, F>(&self, slot: &DriverSlot<T>, resolve: F) -> Result<T, InvalidDriver>
    where
        T: Clone,
        F: FnOnce() -> Result<T, DriverError>,
    {
        let kind = slot.kind();
        self.reporter.driver_loading(kind);
        match resolve() {
            Ok(handle) => {
                for list in [&self.constructed, &self.live] {
                    list.lock().unwrap_or_else(PoisonError::into_inner).push(kind);
                }
                self.reporter.driver_ready(kind);
                Ok(handle)
            }
            Err(source) => {
                let error = InvalidDriver::new(kind, source);
                self.reporter.driver_failed(&error);
                Err(error)
            }
        }
    }
}
