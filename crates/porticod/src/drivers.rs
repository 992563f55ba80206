//! Driver kinds and the contracts pluggable drivers implement.
//!
//! A proxy process wires exactly one storage driver, one cache driver and one
//! transport driver. Storage and cache are shared with the transport through
//! reference-counted handles, so every driver must be safe to use from the
//! transport's connection threads.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

use crate::registry::DriverError;

/// Slots filled by the bootstrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DriverKind {
    /// Persistent catalogue of queues and partitions.
    Storage,
    /// Shared cache used by the transport.
    Cache,
    /// Request-serving front end.
    Transport,
}

impl fmt::Display for DriverKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Storage => "storage",
            Self::Cache => "cache",
            Self::Transport => "transport",
        };
        formatter.write_str(label)
    }
}

/// Error returned when parsing a driver kind fails.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported driver kind: {0}")]
pub struct DriverKindParseError(String);

impl FromStr for DriverKind {
    type Err = DriverKindParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "storage" => Ok(Self::Storage),
            "cache" => Ok(Self::Cache),
            "transport" => Ok(Self::Transport),
            other => Err(DriverKindParseError(other.to_owned())),
        }
    }
}

/// Storage driver contract.
pub trait StorageDriver: Send + Sync + fmt::Debug {
    /// Registered name of the implementation.
    fn name(&self) -> &str;

    /// Releases resources held by the driver.
    fn shutdown(&self) {}
}

/// Cache driver contract.
pub trait CacheDriver: Send + Sync + fmt::Debug {
    /// Backend identifier, e.g. `memory`.
    fn backend(&self) -> &str;

    /// Returns the cached value for `key`.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores `value` under `key`, replacing any previous entry.
    fn set(&self, key: &str, value: Vec<u8>);

    /// Removes `key`, returning whether it was present.
    fn unset(&self, key: &str) -> bool;

    /// Releases resources held by the driver.
    fn shutdown(&self) {}
}

/// Transport driver contract.
pub trait TransportDriver: Send + Sync + fmt::Debug {
    /// Serves requests until the transport decides to stop.
    ///
    /// The bootstrapper calls this exactly once and expects it to block for
    /// the lifetime of the service.
    fn listen(&self) -> Result<(), TransportError>;

    /// Asks a running transport to stop and releases its resources.
    fn shutdown(&self) {}
}

/// Shared storage handle.
pub type StorageHandle = Arc<dyn StorageDriver>;
/// Shared cache handle.
pub type CacheHandle = Arc<dyn CacheDriver>;
/// Shared transport handle.
pub type TransportHandle = Arc<dyn TransportDriver>;

/// Failure reported by a transport while serving.
#[derive(Debug, Error)]
#[error("transport failed: {message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    /// Builds an error without an underlying source.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Builds an error that wraps an underlying source.
    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable message describing the failure.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// A driver slot could not be filled.
///
/// Wraps the registry or provisioner failure. The cause is shared so the
/// memoised failure can be handed to every later caller of the slot.
#[derive(Debug, Clone, Error)]
#[error("invalid {kind} driver: {source}")]
pub struct InvalidDriver {
    /// Slot that failed.
    pub kind: DriverKind,
    #[source]
    source: Arc<DriverError>,
}

impl InvalidDriver {
    /// Wraps a resolution failure for the given slot.
    #[must_use]
    pub fn new(kind: DriverKind, source: DriverError) -> Self {
        Self {
            kind,
            source: Arc::new(source),
        }
    }

    /// Underlying registry or provisioner failure.
    #[must_use]
    pub fn cause(&self) -> &DriverError {
        &self.source
    }
}
