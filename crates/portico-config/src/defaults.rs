use crate::drivers::{STORAGE_OPTION, TRANSPORT_OPTION};
use crate::socket::SocketEndpoint;

/// Default TCP port the gateway transport listens on.
pub const DEFAULT_PROXY_PORT: u16 = 8889;

/// Default cache location.
pub const DEFAULT_CACHE_URL: &str = "memory://";

/// Default log filter expression used by the binaries.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Owned transport driver name for serde and `ortho_config` defaults.
pub fn default_transport_driver_string() -> String {
    TRANSPORT_OPTION.default.to_owned()
}

/// Owned storage driver name for serde and `ortho_config` defaults.
pub fn default_storage_driver_string() -> String {
    STORAGE_OPTION.default.to_owned()
}

/// Owned cache location used where allocation is required (e.g. serde).
pub fn default_cache_url_string() -> String {
    DEFAULT_CACHE_URL.to_owned()
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binaries.
pub fn default_log_format() -> crate::logging::LogFormat {
    crate::logging::LogFormat::Json
}

/// Loopback endpoint used by the gateway transport unless overridden.
pub fn default_proxy_socket() -> SocketEndpoint {
    SocketEndpoint::tcp("127.0.0.1", DEFAULT_PROXY_PORT)
}
