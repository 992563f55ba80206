//! Failures of the gateway's socket listener.

use std::fmt;
use std::io;

use thiserror::Error;

/// What occupies a Unix socket path the gateway wants to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccupiedBy {
    /// A running process still accepts connections on the socket.
    LiveSocket,
    /// The path is a regular file, directory or other non-socket.
    OtherFile,
}

impl fmt::Display for OccupiedBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LiveSocket => "still served by another process",
            Self::OtherFile => "not a socket",
        })
    }
}

/// Errors surfaced while binding or stopping the gateway listener.
#[derive(Debug, Error)]
pub enum ListenerError {
    /// The configured endpoint could not be turned into a socket address.
    #[error("cannot resolve gateway endpoint {endpoint}: {source}")]
    Resolve {
        /// Configured endpoint.
        endpoint: String,
        /// Resolver error.
        #[source]
        source: io::Error,
    },
    /// Binding or configuring the socket failed.
    #[error("failed to bind gateway endpoint {endpoint}: {source}")]
    Bind {
        /// Configured endpoint.
        endpoint: String,
        /// Socket error.
        #[source]
        source: io::Error,
    },
    /// The Unix socket path is taken and was left untouched.
    #[error("gateway socket {path} is {occupant}")]
    Occupied {
        /// Socket path.
        path: String,
        /// What holds the path.
        occupant: OccupiedBy,
    },
    /// A leftover socket file could not be inspected or removed.
    #[error("failed to reclaim gateway socket {path}: {source}")]
    Reclaim {
        /// Socket path.
        path: String,
        #[source]
        source: io::Error,
    },
    /// The accept thread panicked before it could be joined.
    #[error("gateway accept thread panicked")]
    ThreadPanic,
}

impl ListenerError {
    pub(crate) fn bind(endpoint: impl fmt::Display, source: io::Error) -> Self {
        Self::Bind {
            endpoint: endpoint.to_string(),
            source,
        }
    }
}
