//! Test configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use portico_config::{Config, SocketEndpoint};
use tempfile::TempDir;

use crate::bootstrap::{ConfigLoader, ConfigSource};

/// Loader returning a fixed configuration whose socket lives in a temporary
/// directory.
pub struct TestConfigLoader {
    config: Config,
    _socket_dir: Arc<TempDir>,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory for socket");
        let path = dir.path().join("porticod.sock");
        let path = path
            .to_str()
            .expect("temporary socket path was not valid UTF-8")
            .to_owned();
        Self {
            config: Config {
                proxy_socket: SocketEndpoint::unix(path),
                ..Config::default()
            },
            _socket_dir: Arc::new(dir),
        }
    }

    #[must_use]
    pub fn with_storage_driver(mut self, name: &str) -> Self {
        self.config.storage_driver = name.to_owned();
        self
    }

    #[must_use]
    pub fn with_transport_driver(mut self, name: &str) -> Self {
        self.config.transport_driver = name.to_owned();
        self
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl Default for TestConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self, _source: &ConfigSource) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Loader that intentionally fails by passing an invalid socket on the CLI.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self, _source: &ConfigSource) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("porticod"),
            OsString::from("--proxy-socket"),
            OsString::from("invalid://socket"),
        ];
        Config::load_from_iter(args)
    }
}
