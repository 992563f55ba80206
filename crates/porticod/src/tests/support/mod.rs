//! Test doubles for the proxy bootstrap suites.

mod config_loader;
mod registry;
mod reporter;
mod world;

pub use config_loader::{FailingConfigLoader, TestConfigLoader};
pub use registry::{RecordingCacheProvisioner, RecordingDriverRegistry};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
