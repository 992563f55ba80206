//! Structured reporting of bootstrap and driver lifecycle events.

use std::sync::Arc;

use portico_config::{Config, DRIVER_GROUP, DRIVER_OPTIONS};

use crate::access::{AccessMode, TransportNamespace};
use crate::bootstrap::BootstrapError;
use crate::drivers::{DriverKind, InvalidDriver};

const HEALTH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::health");

/// Observer trait used to surface lifecycle events to telemetry sinks.
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self, mode: AccessMode);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config, namespace: &TransportNamespace);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked before a driver slot is resolved.
    fn driver_loading(&self, kind: DriverKind);

    /// Invoked after a driver has been constructed.
    fn driver_ready(&self, kind: DriverKind);

    /// Invoked when a driver slot fails to resolve.
    fn driver_failed(&self, error: &InvalidDriver);

    /// Invoked after a constructed driver has been shut down.
    fn driver_stopped(&self, kind: DriverKind);

    /// Invoked immediately before the transport starts listening.
    fn transport_listening(&self, mode: AccessMode);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self, mode: AccessMode) {
        (**self).bootstrap_starting(mode);
    }

    fn bootstrap_succeeded(&self, config: &Config, namespace: &TransportNamespace) {
        (**self).bootstrap_succeeded(config, namespace);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn driver_loading(&self, kind: DriverKind) {
        (**self).driver_loading(kind);
    }

    fn driver_ready(&self, kind: DriverKind) {
        (**self).driver_ready(kind);
    }

    fn driver_failed(&self, error: &InvalidDriver) {
        (**self).driver_failed(error);
    }

    fn driver_stopped(&self, kind: DriverKind) {
        (**self).driver_stopped(kind);
    }

    fn transport_listening(&self, mode: AccessMode) {
        (**self).transport_listening(mode);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self, mode: AccessMode) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_starting",
            access_mode = %mode,
            "starting proxy bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config, namespace: &TransportNamespace) {
        let drivers = config.drivers();
        tracing::info!(
            target: HEALTH_TARGET,
            event = "bootstrap_succeeded",
            transport_namespace = %namespace,
            transport_driver = drivers.transport,
            storage_driver = drivers.storage,
            cache_url = config.cache_url(),
            "proxy bootstrap completed"
        );
        for option in DRIVER_OPTIONS {
            tracing::debug!(
                target: HEALTH_TARGET,
                event = "driver_option",
                group = DRIVER_GROUP,
                option = option.name,
                value = drivers.get(option.name).unwrap_or(option.default),
                overridden = drivers.get(option.name) != Some(option.default),
                "driver option resolved"
            );
        }
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "bootstrap_failed",
            error = %error,
            "proxy bootstrap failed"
        );
    }

    fn driver_loading(&self, kind: DriverKind) {
        tracing::debug!(
            target: HEALTH_TARGET,
            event = "driver_loading",
            driver = %kind,
            "loading proxy driver"
        );
    }

    fn driver_ready(&self, kind: DriverKind) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "driver_ready",
            driver = %kind,
            "proxy driver ready"
        );
    }

    fn driver_failed(&self, error: &InvalidDriver) {
        tracing::error!(
            target: HEALTH_TARGET,
            event = "driver_failed",
            driver = %error.kind,
            cause = %error.cause(),
            error = ?error,
            "proxy driver failed to load"
        );
    }

    fn driver_stopped(&self, kind: DriverKind) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "driver_stopped",
            driver = %kind,
            "proxy driver stopped"
        );
    }

    fn transport_listening(&self, mode: AccessMode) {
        tracing::info!(
            target: HEALTH_TARGET,
            event = "transport_listening",
            access_mode = %mode,
            "handing control to transport"
        );
    }
}
