//! The `wsgi` gateway transport.

use std::fmt;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use portico_config::SocketEndpoint;
use serde::Serialize;
use tracing::{info, warn};

use super::{
    ListenerHandle, ShutdownCause, ShutdownSignal, ShutdownTrigger, ShutdownWatch,
    SocketListener, StatusHandler, SystemShutdownSignal, TRANSPORT_TARGET,
};
use crate::access::AccessMode;
use crate::drivers::{TransportDriver, TransportError};
use crate::registry::{DriverError, TransportContext};

/// Registered name of [`GatewayTransport`] in every transport namespace.
///
/// The name is kept for configuration compatibility only. The gateway does
/// not speak HTTP: it answers each newline-terminated request on a raw TCP or
/// Unix socket with one line of JSON.
pub const GATEWAY_DRIVER: &str = "wsgi";

#[derive(Debug, Serialize)]
struct StatusDocument<'a> {
    status: &'static str,
    mode: &'static str,
    storage: &'a str,
    cache: &'a str,
}

/// Gateway that serves a status line per request until stopped.
pub struct GatewayTransport {
    access_mode: AccessMode,
    endpoint: SocketEndpoint,
    response: Arc<[u8]>,
    shutdown_signal: Arc<dyn ShutdownSignal>,
    listener: Mutex<Option<ListenerHandle>>,
    local_addr: Mutex<Option<SocketAddr>>,
    stop: Mutex<Option<ShutdownTrigger>>,
}

impl fmt::Debug for GatewayTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GatewayTransport")
            .field("access_mode", &self.access_mode)
            .field("endpoint", &self.endpoint)
            .field("local_addr", &self.local_addr())
            .finish_non_exhaustive()
    }
}

impl GatewayTransport {
    /// Builds a gateway wired to the drivers in `context`.
    ///
    /// The gateway stops on process termination signals once listening.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::Construction`] when the status document cannot
    /// be rendered.
    pub fn from_context(context: TransportContext<'_>) -> Result<Self, DriverError> {
        let namespace = context.access_mode.transport_namespace();
        let document = StatusDocument {
            status: "ok",
            mode: context.access_mode.transport_family(),
            storage: context.storage.name(),
            cache: context.cache.backend(),
        };
        let mut response = serde_json::to_vec(&document).map_err(|error| {
            DriverError::construction(
                namespace.as_str(),
                GATEWAY_DRIVER,
                "failed to render status document",
            )
            .with_source(error)
        })?;
        response.push(b'\n');

        Ok(Self {
            access_mode: context.access_mode,
            endpoint: context.config.proxy_socket().clone(),
            response: response.into(),
            shutdown_signal: Arc::new(SystemShutdownSignal),
            listener: Mutex::new(None),
            local_addr: Mutex::new(None),
            stop: Mutex::new(None),
        })
    }

    /// Replaces the external signal source armed by `listen`.
    #[must_use]
    pub fn with_shutdown_signal(mut self, signal: Arc<dyn ShutdownSignal>) -> Self {
        self.shutdown_signal = signal;
        self
    }

    /// Endpoint the gateway binds.
    #[must_use]
    pub fn endpoint(&self) -> &SocketEndpoint {
        &self.endpoint
    }

    /// TCP address bound by a running gateway.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self
            .local_addr
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Binds the endpoint and starts accepting; `stop` becomes the handle the
    /// shutdown hook fires.
    fn start_listener(&self, stop: ShutdownTrigger) -> Result<(), TransportError> {
        *self.stop.lock().unwrap_or_else(PoisonError::into_inner) = Some(stop);
        self.endpoint.prepare_filesystem().map_err(|error| {
            TransportError::with_source("failed to prepare gateway socket", error)
        })?;
        let listener = SocketListener::bind(&self.endpoint)
            .map_err(|error| TransportError::with_source("failed to bind gateway", error))?;
        *self
            .local_addr
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = listener.local_addr();

        let handler = Arc::new(StatusHandler::new(Arc::clone(&self.response)));
        let handle = listener
            .start(handler)
            .map_err(|error| TransportError::with_source("failed to start gateway", error))?;
        *self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
        Ok(())
    }

    fn stop_listener(&self) -> Result<(), TransportError> {
        let handle = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(handle) = handle else {
            return Ok(());
        };
        handle
            .stop()
            .map_err(|error| TransportError::with_source("gateway listener failed", error))
    }
}

impl TransportDriver for GatewayTransport {
    /// Serves until a stop signal arrives or [`TransportDriver::shutdown`]
    /// runs.
    ///
    /// The signal source is armed before the socket is bound, so a signal
    /// delivered during start-up still stops the gateway cleanly.
    fn listen(&self) -> Result<(), TransportError> {
        let watch = ShutdownWatch::new();
        let disarm = self.shutdown_signal.arm(watch.trigger()).map_err(|error| {
            TransportError::with_source("failed to install shutdown signal", error)
        })?;
        if let Err(error) = self.start_listener(watch.trigger()) {
            disarm();
            self.stop.lock().unwrap_or_else(PoisonError::into_inner).take();
            return Err(error);
        }
        info!(
            target: TRANSPORT_TARGET,
            mode = %self.access_mode,
            endpoint = %self.endpoint,
            "gateway listening"
        );

        let cause = watch.wait();
        disarm();
        self.stop.lock().unwrap_or_else(PoisonError::into_inner).take();
        let stopped = self.stop_listener();
        info!(
            target: TRANSPORT_TARGET,
            mode = %self.access_mode,
            cause = %cause,
            "gateway stopped"
        );
        stopped
    }

    fn shutdown(&self) {
        let stop = self.stop.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(stop) = stop {
            stop.fire(ShutdownCause::Requested);
        }
        if let Err(error) = self.stop_listener() {
            warn!(
                target: TRANSPORT_TARGET,
                error = %error,
                "gateway shutdown failed"
            );
        }
    }
}
