//! Process entry points shared by the proxy binaries.

use std::process::ExitCode;

use thiserror::Error;
use tracing::{error, info};

use crate::access::AccessMode;
use crate::bootstrap::{
    Bootstrap, BootstrapError, Collaborators, ConfigLoader, ConfigSource, RunError,
    SystemConfigLoader,
};
use crate::registry::DriverError;

const PROCESS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::process");

/// Errors that end a proxy process.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The built-in driver table could not be assembled.
    #[error("failed to build the driver registry: {0}")]
    Registry(#[from] DriverError),
    /// Configuration or telemetry failed before any driver was touched.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),
    /// Wiring or serving failed.
    #[error(transparent)]
    Run(#[from] RunError),
}

/// Runs a proxy for `mode` with the process arguments and built-in drivers.
///
/// Failures are logged and written to standard error; the exit code reports
/// whether the proxy stopped cleanly.
#[must_use]
pub fn run_proxy(mode: AccessMode) -> ExitCode {
    let source = ConfigSource::from_env();
    let outcome = Collaborators::builtin()
        .map_err(ProcessError::from)
        .and_then(|collaborators| {
            run_proxy_with(mode, &source, &SystemConfigLoader, collaborators)
        });
    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(failure) => {
            error!(
                target: PROCESS_TARGET,
                mode = %mode,
                error = %failure,
                "proxy terminated"
            );
            eprintln!("porticod ({mode}): {failure}");
            ExitCode::FAILURE
        }
    }
}

/// Runs a proxy with injected collaborators.
///
/// # Errors
///
/// Returns [`ProcessError::Bootstrap`] when configuration or telemetry fails
/// and [`ProcessError::Run`] when wiring or serving fails.
pub fn run_proxy_with(
    mode: AccessMode,
    source: &ConfigSource,
    loader: &dyn ConfigLoader,
    collaborators: Collaborators,
) -> Result<(), ProcessError> {
    let bootstrap = Bootstrap::new(mode, source, loader, collaborators)?;
    info!(
        target: PROCESS_TARGET,
        mode = %mode,
        namespace = %bootstrap.transport_namespace(),
        "starting proxy"
    );
    bootstrap.run()?;
    info!(
        target: PROCESS_TARGET,
        mode = %mode,
        "proxy stopped"
    );
    Ok(())
}
