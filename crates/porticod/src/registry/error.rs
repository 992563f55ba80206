//! Failures raised while resolving or constructing drivers.

use thiserror::Error;

/// Errors arising from driver registries and cache provisioners.
#[derive(Debug, Error)]
pub enum DriverError {
    /// No driver is registered under the requested name.
    #[error("no driver named '{name}' in namespace '{namespace}'")]
    NotFound {
        /// Namespace that was searched.
        namespace: String,
        /// Name that was looked up.
        name: String,
    },

    /// A driver with the same name is already registered.
    #[error("driver '{name}' is already registered in namespace '{namespace}'")]
    Duplicate {
        /// Namespace of the existing registration.
        namespace: String,
        /// Conflicting name.
        name: String,
    },

    /// The driver was found but its constructor failed.
    #[error("driver '{name}' in namespace '{namespace}' failed to load: {message}")]
    Construction {
        /// Namespace of the driver.
        namespace: String,
        /// Driver name.
        name: String,
        /// Human-readable failure description.
        message: String,
        /// Optional error reported by the constructor.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The cache location could not be parsed.
    #[error("invalid cache url '{url}': {source}")]
    InvalidCacheUrl {
        /// Configured location.
        url: String,
        /// Parser error.
        #[source]
        source: url::ParseError,
    },

    /// The cache location names a backend nobody provides.
    #[error("unsupported cache backend '{scheme}' in '{url}'")]
    UnsupportedCache {
        /// Configured location.
        url: String,
        /// Scheme that was not recognised.
        scheme: String,
    },
}

impl DriverError {
    /// Builds a construction failure from a constructor's message.
    #[must_use]
    pub fn construction(
        namespace: impl Into<String>,
        name: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Construction {
            namespace: namespace.into(),
            name: name.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Attaches an underlying error to a construction failure.
    ///
    /// Other variants are returned unchanged.
    #[must_use]
    pub fn with_source(self, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        match self {
            Self::Construction {
                namespace,
                name,
                message,
                ..
            } => Self::Construction {
                namespace,
                name,
                message,
                source: Some(cause.into()),
            },
            other => other,
        }
    }
}
