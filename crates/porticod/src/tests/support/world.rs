//! BDD test world: owns the collaborators, the bootstrapper and the outcomes
//! observed by step functions.

use std::cell::RefCell;
use std::sync::Arc;

use crate::bootstrap::{Bootstrap, BootstrapError, Collaborators, ConfigLoader, ConfigSource, RunError};
use crate::drivers::{DriverKind, InvalidDriver};

use super::config_loader::{FailingConfigLoader, TestConfigLoader};
use super::registry::{RecordingCacheProvisioner, RecordingDriverRegistry};
use super::reporter::RecordingHealthReporter;

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    mode_label: String,
    pub registry: RecordingDriverRegistry,
    pub provisioner: RecordingCacheProvisioner,
    pub reporter: Arc<RecordingHealthReporter>,
    bootstrap: Option<Bootstrap>,
    bootstrap_error: Option<BootstrapError>,
    driver_result: Option<Result<(), InvalidDriver>>,
    run_result: Option<Result<(), RunError>>,
}

impl TestWorld {
    /// Builds a public-mode world with a successful configuration loader.
    #[must_use]
    pub fn new() -> Self {
        let registry = RecordingDriverRegistry::default();
        let provisioner = RecordingCacheProvisioner::sharing_log_with(&registry);
        Self {
            loader: Box::new(TestConfigLoader::new()),
            mode_label: String::from("public"),
            registry,
            provisioner,
            reporter: Arc::new(RecordingHealthReporter::default()),
            bootstrap: None,
            bootstrap_error: None,
            driver_result: None,
            run_result: None,
        }
    }

    /// Installs a loader that always fails.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
    }

    /// Installs a loader that selects `name` as the storage driver.
    pub fn use_storage_driver(&mut self, name: &str) {
        self.loader = Box::new(TestConfigLoader::new().with_storage_driver(name));
    }

    /// Selects the access mode label handed to the bootstrapper.
    pub fn use_access_mode(&mut self, label: &str) {
        label.clone_into(&mut self.mode_label);
    }

    /// Constructs the bootstrapper once.
    pub fn bootstrap(&mut self) {
        if self.bootstrap.is_some() || self.bootstrap_error.is_some() {
            return;
        }
        let collaborators = Collaborators {
            registry: Arc::new(self.registry.clone()),
            cache_provisioner: Arc::new(self.provisioner.clone()),
            reporter: self.reporter.clone(),
        };
        match Bootstrap::from_mode_label(
            &self.mode_label,
            &ConfigSource::new(),
            &*self.loader,
            collaborators,
        ) {
            Ok(bootstrap) => self.bootstrap = Some(bootstrap),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    /// Requests one driver slot through its accessor.
    pub fn request_driver(&mut self, kind: DriverKind) {
        let Some(bootstrap) = self.bootstrap.as_ref() else {
            return;
        };
        let result = match kind {
            DriverKind::Storage => bootstrap.storage().map(drop),
            DriverKind::Cache => bootstrap.cache().map(drop),
            DriverKind::Transport => bootstrap.transport().map(drop),
        };
        self.driver_result = Some(result);
    }

    /// Runs the proxy to completion.
    pub fn run(&mut self) {
        if let Some(bootstrap) = self.bootstrap.as_ref() {
            self.run_result = Some(bootstrap.run());
        }
    }

    #[must_use]
    pub fn bootstrap_handle(&self) -> Option<&Bootstrap> {
        self.bootstrap.as_ref()
    }

    #[must_use]
    pub fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    #[must_use]
    pub fn driver_result(&self) -> Option<&Result<(), InvalidDriver>> {
        self.driver_result.as_ref()
    }

    #[must_use]
    pub fn run_result(&self) -> Option<&Result<(), RunError>> {
        self.run_result.as_ref()
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
