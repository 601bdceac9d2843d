//! Diagnostic logging for the worker.
//!
//! Standard output belongs to the protocol, so every diagnostic goes to
//! standard error.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use funcworker_config::{Config, LogFormat};

static TELEMETRY_GUARD: OnceCell<()> = OnceCell::new();

/// Handle returned when telemetry has been initialised.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryHandle;

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured filter expression did not parse.
    #[error("invalid log filter '{expression}': {message}")]
    Filter {
        /// Expression taken from `log_filter`.
        expression: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Another global subscriber was already installed.
    #[error("failed to install telemetry subscriber: {source}")]
    Subscriber {
        /// Underlying installation error.
        #[source]
        source: SetGlobalDefaultError,
    },
}

/// Installs the global stderr subscriber on first use.
///
/// Later calls return a fresh handle without touching global state, so
/// tests and embedders may call this more than once.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when `log_filter` is not a valid
/// `tracing` filter and [`TelemetryError::Subscriber`] when a different
/// subscriber already owns the global slot.
pub fn initialise(config: &Config) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|_| TelemetryHandle)
}

fn build_filter(expression: &str) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(expression).map_err(|error| TelemetryError::Filter {
        expression: expression.to_owned(),
        message: error.to_string(),
    })
}

fn install_subscriber(config: &Config) -> Result<(), TelemetryError> {
    let filter = build_filter(config.log_filter())?;

    let builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|source| TelemetryError::Subscriber { source })
}
