//! Shared configuration for the Portico proxy binaries.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then an
//! optional TOML file (`--config-path` or `PORTICO_CONFIG_PATH`), then
//! `PORTICO_*` environment variables, then command-line flags. The resulting
//! [`Config`] is an explicit value handed to the bootstrapper; nothing here
//! mutates process-wide state.

mod defaults;
mod drivers;
mod logging;
mod socket;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_CACHE_URL, DEFAULT_LOG_FILTER, DEFAULT_PROXY_PORT, default_cache_url_string,
    default_log_filter_string, default_log_format, default_proxy_socket,
    default_storage_driver_string, default_transport_driver_string,
};
pub use drivers::{DRIVER_GROUP, DRIVER_OPTIONS, DriverOptions, OptionSpec};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError, SocketPreparationError};

/// Resolved configuration for a proxy process.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "PORTICO")]
pub struct Config {
    /// Name of the transport driver to load for the active access mode.
    #[serde(default = "default_transport_driver_string")]
    #[ortho_config(default = default_transport_driver_string())]
    pub transport_driver: String,
    /// Name of the storage driver to load.
    #[serde(default = "default_storage_driver_string")]
    #[ortho_config(default = default_storage_driver_string())]
    pub storage_driver: String,
    /// Cache backend location, e.g. `memory://`.
    #[serde(default = "default_cache_url_string")]
    #[ortho_config(default = default_cache_url_string())]
    pub cache_url: String,
    /// Endpoint the built-in gateway transport listens on.
    #[serde(default = "default_proxy_socket")]
    #[ortho_config(default = default_proxy_socket())]
    pub proxy_socket: SocketEndpoint,
    /// `tracing` filter expression applied to the process subscriber.
    #[serde(default = "default_log_filter_string")]
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Output format of the process subscriber.
    #[serde(default = "default_log_format")]
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport_driver: default_transport_driver_string(),
            storage_driver: default_storage_driver_string(),
            cache_url: default_cache_url_string(),
            proxy_socket: default_proxy_socket(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Options of the "proxy drivers" group.
    #[must_use]
    pub fn drivers(&self) -> DriverOptions<'_> {
        DriverOptions {
            transport: self.transport_driver.as_str(),
            storage: self.storage_driver.as_str(),
        }
    }

    /// Configured transport driver name.
    #[must_use]
    pub fn transport_driver(&self) -> &str {
        self.transport_driver.as_str()
    }

    /// Configured storage driver name.
    #[must_use]
    pub fn storage_driver(&self) -> &str {
        self.storage_driver.as_str()
    }

    /// Configured cache location.
    #[must_use]
    pub fn cache_url(&self) -> &str {
        self.cache_url.as_str()
    }

    /// Endpoint the gateway transport binds.
    #[must_use]
    pub fn proxy_socket(&self) -> &SocketEndpoint {
        &self.proxy_socket
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}
