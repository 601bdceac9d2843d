//! Line-delimited JSON function worker.
//!
//! The worker speaks a small protocol over standard input and output. It
//! announces itself with `started`, waits for a `function` message whose
//! source it can convert, confirms with `function_loaded`, and from then on
//! answers every `request` with a `response` computed by the loaded
//! function. Diagnostics go to standard error through `tracing`.
//!
//! [`run_stdio`] wires the pieces together for the binary; [`run_worker`]
//! drives the same protocol over arbitrary streams.

pub mod bootstrap;
pub mod error;
pub mod telemetry;
pub mod worker;

#[cfg(test)]
mod tests;

use std::io;

use funcworker_loader::loader_for;

pub use self::bootstrap::{BootstrapError, ConfigLoader, SystemConfigLoader, bootstrap_with};
pub use self::error::{RunError, WorkerError};
pub use self::worker::{
    Clock, FunctionSlot, SystemClock, WORKER_TARGET, Worker, WorkerOptions, WorkerState,
    run_worker,
};

/// Bootstraps from `loader` and serves the protocol on stdin and stdout.
///
/// Returns `Ok(())` once standard input is closed.
///
/// # Errors
///
/// Returns [`RunError::Bootstrap`] when configuration or telemetry cannot be
/// set up, in which case nothing has been written to stdout, and
/// [`RunError::Worker`] for fatal protocol errors.
pub fn run_stdio(loader: &dyn ConfigLoader) -> Result<(), RunError> {
    let config = bootstrap_with(loader)?.into_config();
    let worker = Worker::new(
        loader_for(config.strategy(), config.entry_point()),
        WorkerOptions::from_config(&config),
    );

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let stdout = io::stdout();
    let mut writer = stdout.lock();
    run_worker(&mut reader, &mut writer, worker)?;
    Ok(())
}
