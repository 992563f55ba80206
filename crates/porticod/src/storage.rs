//! Built-in in-process storage driver.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::drivers::StorageDriver;

const STORAGE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::storage::memory");

/// Registered name of [`MemoryStorage`].
pub const MEMORY_STORAGE_DRIVER: &str = "memory";

/// Storage driver that keeps no state outside the process.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    closed: AtomicBool,
}

impl MemoryStorage {
    /// Creates an open storage driver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once [`StorageDriver::shutdown`] has run.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl StorageDriver for MemoryStorage {
    fn name(&self) -> &str {
        MEMORY_STORAGE_DRIVER
    }

    fn shutdown(&self) {
        if !self.closed.swap(true, Ordering::SeqCst) {
            debug!(target: STORAGE_TARGET, "memory storage closed");
        }
    }
}
