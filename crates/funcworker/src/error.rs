//! Errors that end the worker's protocol loop.

use funcworker_loader::InvocationError;
use funcworker_protocol::ChannelError;
use thiserror::Error;

use crate::bootstrap::BootstrapError;

/// Fatal errors raised while serving the protocol.
///
/// Framing errors and conversion failures are not listed here: the worker
/// reports those and keeps running.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Reading input or writing output failed.
    #[error(transparent)]
    Channel {
        /// Underlying channel error.
        #[from]
        source: ChannelError,
    },

    /// The loaded function failed under the `crash` failure policy.
    #[error("function invocation failed: {source}")]
    Invocation {
        /// Underlying invocation error.
        #[source]
        source: InvocationError,
    },

    /// The request log timestamp could not be rendered.
    #[error("failed to format request timestamp: {source}")]
    Timestamp {
        /// Underlying formatting error.
        #[source]
        source: time::error::Format,
    },
}

/// Errors surfaced by [`crate::run_stdio`].
#[derive(Debug, Error)]
pub enum RunError {
    /// The worker could not be configured.
    #[error(transparent)]
    Bootstrap(#[from] BootstrapError),

    /// The protocol loop stopped on a fatal error.
    #[error(transparent)]
    Worker(#[from] WorkerError),
}
