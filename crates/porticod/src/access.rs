//! Access modes and the transport namespaces they select.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Kind of traffic a proxy process serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    /// Public-facing queue traffic.
    Public,
    /// Administrative traffic such as partition and catalogue management.
    Admin,
}

impl AccessMode {
    /// Every supported access mode.
    pub const ALL: [Self; 2] = [Self::Public, Self::Admin];

    /// Transport family looked up for this mode.
    #[must_use]
    pub const fn transport_family(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Admin => "admin",
        }
    }

    /// Registry namespace that holds this mode's transport drivers.
    #[must_use]
    pub fn transport_namespace(self) -> TransportNamespace {
        TransportNamespace(format!("{}.transport", self.transport_family()))
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.transport_family())
    }
}

impl FromStr for AccessMode {
    type Err = UnknownAccessMode;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "admin" => Ok(Self::Admin),
            _ => Err(UnknownAccessMode::new(value)),
        }
    }
}

/// Error returned when an access mode label is not recognised.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown access mode: {0}")]
pub struct UnknownAccessMode(String);

impl UnknownAccessMode {
    /// Creates an error describing the rejected label.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Label that failed to parse.
    #[must_use]
    pub fn value(&self) -> &str {
        self.0.as_str()
    }
}

/// Registry namespace for a transport family, e.g. `public.transport`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransportNamespace(String);

impl TransportNamespace {
    /// Namespace as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for TransportNamespace {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}
