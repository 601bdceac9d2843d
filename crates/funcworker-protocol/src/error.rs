//! Errors raised while framing or decoding protocol lines.
//!
//! I/O errors are wrapped in `Arc` to keep the enums small and cloneable for
//! the `result_large_err` Clippy lint.

use std::io;
use std::sync::Arc;

use thiserror::Error;

/// A line could not be decoded into a protocol message.
///
/// These are framing errors: the worker reports them on its diagnostic
/// stream and moves on to the next line.
#[derive(Debug, Error)]
pub enum MessageError {
    /// The line was empty or contained only whitespace.
    #[error("malformed message: {message}")]
    Malformed {
        /// Human-readable description of the problem.
        message: String,
    },

    /// The line was not a JSON object with `type` and `data` fields.
    #[error("invalid message JSON: {source}")]
    InvalidJson {
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl MessageError {
    /// Creates a malformed message error with a custom message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for MessageError {
    fn from(source: serde_json::Error) -> Self {
        Self::InvalidJson { source }
    }
}

/// The channel could not read from or write to its streams.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    /// Reading the next line from the input stream failed.
    #[error("failed to read from input stream: {source}")]
    Read {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// Writing or flushing an outbound line failed.
    #[error("failed to write to output stream: {source}")]
    Write {
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },

    /// An outbound message could not be serialised.
    #[error("failed to serialise outbound message: {source}")]
    Serialize {
        /// Underlying JSON error.
        #[source]
        source: Arc<serde_json::Error>,
    },
}

impl ChannelError {
    pub(crate) fn read(source: io::Error) -> Self {
        Self::Read {
            source: Arc::new(source),
        }
    }

    pub(crate) fn write(source: io::Error) -> Self {
        Self::Write {
            source: Arc::new(source),
        }
    }

    pub(crate) fn serialize(source: serde_json::Error) -> Self {
        Self::Serialize {
            source: Arc::new(source),
        }
    }
}
