//! Stop conditions for a listening gateway.
//!
//! A [`ShutdownWatch`] is created per `listen` call. Signal sources are armed
//! against its [`ShutdownTrigger`] before the socket is bound, and
//! `GatewayTransport::shutdown` fires the same trigger, so `listen` returns on
//! whichever comes first.

use std::fmt;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use signal_hook::consts::signal::{SIGHUP, SIGINT, SIGQUIT, SIGTERM};
use signal_hook::iterator::Signals;
use thiserror::Error;
use tracing::debug;

use super::TRANSPORT_TARGET;

/// Signals that stop the gateway.
const STOP_SIGNALS: [i32; 4] = [SIGTERM, SIGINT, SIGQUIT, SIGHUP];

/// Reason a gateway stopped listening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownCause {
    /// A process signal arrived.
    Signal(i32),
    /// The driver's shutdown hook was invoked.
    Requested,
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signal(signal) => write!(f, "signal {signal}"),
            Self::Requested => f.write_str("shutdown requested"),
        }
    }
}

/// Sending half of a [`ShutdownWatch`].
#[derive(Debug, Clone)]
pub struct ShutdownTrigger(Sender<ShutdownCause>);

impl ShutdownTrigger {
    /// Releases the watch. Firing after the watch is gone does nothing.
    pub fn fire(&self, cause: ShutdownCause) {
        let _ = self.0.send(cause);
    }
}

/// Blocks a listening gateway until its first stop condition.
#[derive(Debug)]
pub(crate) struct ShutdownWatch {
    receiver: Receiver<ShutdownCause>,
    trigger: ShutdownTrigger,
}

impl ShutdownWatch {
    pub(crate) fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            receiver,
            trigger: ShutdownTrigger(sender),
        }
    }

    pub(crate) fn trigger(&self) -> ShutdownTrigger {
        self.trigger.clone()
    }

    /// Waits for the first cause fired on any trigger.
    pub(crate) fn wait(&self) -> ShutdownCause {
        // The watch owns a sender, so the channel cannot disconnect.
        self.receiver.recv().unwrap_or(ShutdownCause::Requested)
    }
}

/// Releases whatever a [`ShutdownSignal`] installed.
pub type Disarm = Box<dyn FnOnce() + Send>;

/// Source of external stop requests, armed once per `listen` call.
pub trait ShutdownSignal: Send + Sync {
    /// Starts delivering stop requests to `trigger`.
    ///
    /// The returned closure runs when the gateway stops, however it stopped.
    fn arm(&self, trigger: ShutdownTrigger) -> Result<Disarm, ShutdownError>;
}

/// Errors reported while arming a shutdown signal.
#[derive(Debug, Error)]
pub enum ShutdownError {
    /// Installing signal handlers failed.
    #[error("failed to install signal handlers: {source}")]
    Install {
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}

/// Stops the gateway on SIGTERM, SIGINT, SIGQUIT or SIGHUP.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemShutdownSignal;

impl ShutdownSignal for SystemShutdownSignal {
    fn arm(&self, trigger: ShutdownTrigger) -> Result<Disarm, ShutdownError> {
        let mut signals =
            Signals::new(STOP_SIGNALS).map_err(|source| ShutdownError::Install { source })?;
        let handle = signals.handle();
        thread::spawn(move || {
            if let Some(signal) = signals.forever().next() {
                debug!(target: TRANSPORT_TARGET, signal, "stop signal delivered");
                trigger.fire(ShutdownCause::Signal(signal));
            }
        });
        Ok(Box::new(move || handle.close()))
    }
}
