//! Worker bootstrap: configuration, validation and telemetry.
//!
//! Bootstrap runs before the protocol starts. Any failure here means the
//! orchestrator never sees `started`.

use std::sync::Arc;

use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;
use tracing::info;

use funcworker_config::{Config, ConfigError};

use crate::telemetry::{self, TelemetryError, TelemetryHandle};
use crate::worker::WORKER_TARGET;

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the worker configuration.
    ///
    /// # Errors
    ///
    /// Returns the layered loader's error when any source is malformed.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Configuration loaded but is unusable.
    #[error("invalid configuration: {source}")]
    Validation {
        /// Violated configuration rule.
        #[source]
        source: ConfigError,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
}

/// Result of a successful bootstrap.
#[derive(Debug)]
pub struct Bootstrapped {
    config: Config,
    telemetry: TelemetryHandle,
}

impl Bootstrapped {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// Consumes the bootstrap result, returning the configuration.
    #[must_use]
    pub fn into_config(self) -> Config {
        self.config
    }
}

/// Loads and validates configuration, then installs telemetry.
///
/// # Errors
///
/// Returns a [`BootstrapError`] naming the first step that failed.
pub fn bootstrap_with(loader: &dyn ConfigLoader) -> Result<Bootstrapped, BootstrapError> {
    let config = loader
        .load()
        .map_err(|source| BootstrapError::Configuration { source })?;
    config
        .validate()
        .map_err(|source| BootstrapError::Validation { source })?;
    let telemetry =
        telemetry::initialise(&config).map_err(|source| BootstrapError::Telemetry { source })?;

    info!(
        target: WORKER_TARGET,
        strategy = %config.strategy(),
        entry_point = config.entry_point(),
        on_invoke_error = %config.on_invoke_error(),
        request_logging = config.request_logging(),
        "worker configured"
    );
    Ok(Bootstrapped { config, telemetry })
}
