//! Cache provisioning.
//!
//! Unlike storage and transport, the cache is not picked by a driver name: the
//! provisioner inspects the whole configuration (currently its `cache_url`)
//! and returns a ready handle.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use portico_config::Config;
use tracing::debug;
use url::Url;

use crate::drivers::{CacheDriver, CacheHandle};
use crate::registry::DriverError;

const CACHE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::cache");

/// Produces the process cache from configuration.
pub trait CacheProvisioner: Send + Sync {
    /// Builds the cache described by `config`.
    fn get_cache(&self, config: &Config) -> Result<CacheHandle, DriverError>;
}

/// Provisioner that understands the `memory://` scheme.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConfiguredCacheProvisioner;

impl CacheProvisioner for ConfiguredCacheProvisioner {
    fn get_cache(&self, config: &Config) -> Result<CacheHandle, DriverError> {
        let location = config.cache_url();
        let url = Url::parse(location).map_err(|source| DriverError::InvalidCacheUrl {
            url: location.to_owned(),
            source,
        })?;
        match url.scheme() {
            "memory" => {
                debug!(target: CACHE_TARGET, url = %url, "provisioning memory cache");
                Ok(Arc::new(MemoryCache::new()))
            }
            other => Err(DriverError::UnsupportedCache {
                url: location.to_owned(),
                scheme: other.to_owned(),
            }),
        }
    }
}

/// Unbounded in-process cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheDriver for MemoryCache {
    fn backend(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: Vec<u8>) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_owned(), value);
    }

    fn unset(&self, key: &str) -> bool {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
            .is_some()
    }

    fn shutdown(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
