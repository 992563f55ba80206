//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::sync::Mutex;

use portico_config::Config;

use crate::access::{AccessMode, TransportNamespace};
use crate::bootstrap::BootstrapError;
use crate::drivers::{DriverKind, InvalidDriver};
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    BootstrapStarting(AccessMode),
    /// Carries the computed transport namespace.
    BootstrapSucceeded(String),
    BootstrapFailed(String),
    DriverLoading(DriverKind),
    DriverReady(DriverKind),
    DriverFailed { kind: DriverKind, message: String },
    DriverStopped(DriverKind),
    TransportListening(AccessMode),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self, mode: AccessMode) {
        self.record(HealthEvent::BootstrapStarting(mode));
    }

    fn bootstrap_succeeded(&self, _config: &Config, namespace: &TransportNamespace) {
        self.record(HealthEvent::BootstrapSucceeded(namespace.to_string()));
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn driver_loading(&self, kind: DriverKind) {
        self.record(HealthEvent::DriverLoading(kind));
    }

    fn driver_ready(&self, kind: DriverKind) {
        self.record(HealthEvent::DriverReady(kind));
    }

    fn driver_failed(&self, error: &InvalidDriver) {
        self.record(HealthEvent::DriverFailed {
            kind: error.kind,
            message: error.cause().to_string(),
        });
    }

    fn driver_stopped(&self, kind: DriverKind) {
        self.record(HealthEvent::DriverStopped(kind));
    }

    fn transport_listening(&self, mode: AccessMode) {
        self.record(HealthEvent::TransportListening(mode));
    }
}
