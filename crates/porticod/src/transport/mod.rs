//! Built-in gateway transport.
//!
//! The gateway binds the configured socket endpoint, accepts connections on a
//! background thread and answers each request line with a status document. It
//! blocks the bootstrapper in `listen` until a stop signal arrives or its
//! shutdown hook runs.

mod errors;
mod gateway;
mod handler;
mod listener;
mod shutdown;
#[cfg(test)]
mod test_utils;

pub use self::errors::{ListenerError, OccupiedBy};
pub use self::gateway::{GATEWAY_DRIVER, GatewayTransport};
pub(crate) use self::handler::{ConnectionHandler, ConnectionStream, StatusHandler};
pub(crate) use self::listener::{ListenerHandle, SocketListener};
pub(crate) use self::shutdown::ShutdownWatch;
pub use self::shutdown::{
    Disarm, ShutdownCause, ShutdownError, ShutdownSignal, ShutdownTrigger, SystemShutdownSignal,
};
#[cfg(test)]
pub(crate) use self::test_utils::ManualShutdownSignal;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");
