//! Typed protocol messages.
//!
//! On the wire every message is an [`Envelope`]: a `type` tag and a `data`
//! payload, plus an optional `time` stamp carried only by `log` lines.
//! Inbound envelopes are classified into [`InboundMessage`]; unknown tags are
//! kept as [`InboundMessage::Other`] rather than rejected, because the worker
//! ignores them silently. Outbound messages are built as [`OutboundMessage`]
//! and serialised through the envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MessageError;

/// Tag of an inbound message carrying source text to load.
pub const FUNCTION: &str = "function";
/// Tag of an inbound message carrying an invocation argument.
pub const REQUEST: &str = "request";
/// Tag of the startup announcement.
pub const STARTED: &str = "started";
/// Tag of the load outcome.
pub const FUNCTION_LOADED: &str = "function_loaded";
/// Tag of an invocation result.
pub const RESPONSE: &str = "response";
/// Tag of a reported invocation failure.
pub const ERROR: &str = "error";
/// Tag of a protocol-level trace line.
pub const LOG: &str = "log";

/// The two-field record exchanged on every protocol line.
///
/// # Example
///
/// ```
/// use funcworker_protocol::Envelope;
///
/// let envelope: Envelope = serde_json::from_str(r#"{"type":"request","data":42}"#)
///     .expect("valid envelope");
/// assert_eq!(envelope.kind(), "request");
/// assert_eq!(envelope.data(), &serde_json::json!(42));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    time: Option<String>,
}

impl Envelope {
    /// Creates an envelope with the given tag and payload.
    #[must_use]
    pub fn new(kind: impl Into<String>, data: Value) -> Self {
        Self {
            kind: kind.into(),
            data,
            time: None,
        }
    }

    /// Attaches a timestamp to the envelope.
    #[must_use]
    pub fn with_time(mut self, time: impl Into<String>) -> Self {
        self.time = Some(time.into());
        self
    }

    /// Returns the `type` tag.
    #[must_use]
    pub const fn kind(&self) -> &str {
        self.kind.as_str()
    }

    /// Returns the `data` payload.
    #[must_use]
    pub const fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the timestamp, if any.
    #[must_use]
    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }
}

/// A decoded inbound line.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Source text to convert into the worker's function. The payload is
    /// kept as raw JSON; a non-string payload is a conversion failure, not a
    /// framing error.
    Function(Value),
    /// Argument for one invocation of the loaded function.
    Request(Value),
    /// Any other well-formed message. Ignored by the worker.
    Other {
        /// The unrecognised `type` tag.
        kind: String,
    },
}

impl InboundMessage {
    /// Decodes one protocol line.
    ///
    /// Surrounding whitespace, including a leftover line terminator, is
    /// ignored. Objects may carry fields beyond `type` and `data`.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::Malformed`] for a blank line and
    /// [`MessageError::InvalidJson`] when the line is not an object with
    /// both `type` and `data`.
    ///
    /// # Example
    ///
    /// ```
    /// use funcworker_protocol::InboundMessage;
    ///
    /// let message = InboundMessage::parse(r#"{"type":"ping","data":null}"#)
    ///     .expect("well-formed line");
    /// assert_eq!(message, InboundMessage::Other { kind: String::from("ping") });
    /// ```
    pub fn parse(line: &str) -> Result<Self, MessageError> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Err(MessageError::malformed("empty message line"));
        }

        let envelope: Envelope = serde_json::from_str(trimmed)?;
        Ok(Self::from(envelope))
    }

    /// Returns the `type` tag this message arrived with.
    #[must_use]
    pub fn kind(&self) -> &str {
        match self {
            Self::Function(_) => FUNCTION,
            Self::Request(_) => REQUEST,
            Self::Other { kind } => kind.as_str(),
        }
    }
}

impl From<Envelope> for InboundMessage {
    fn from(envelope: Envelope) -> Self {
        match envelope.kind.as_str() {
            FUNCTION => Self::Function(envelope.data),
            REQUEST => Self::Request(envelope.data),
            _ => Self::Other {
                kind: envelope.kind,
            },
        }
    }
}

/// A message the worker writes to its output stream.
///
/// Serialises as one [`Envelope`], so field order on the wire is always
/// `type`, `data`, then `time` when present.
///
/// # Example
///
/// ```
/// use funcworker_protocol::OutboundMessage;
///
/// let line = serde_json::to_string(&OutboundMessage::FunctionLoaded(true))
///     .expect("serialisable");
/// assert_eq!(line, r#"{"type":"function_loaded","data":true}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "Envelope")]
pub enum OutboundMessage {
    /// Startup announcement, emitted once before any input is read.
    Started,
    /// Outcome of a `function` message.
    FunctionLoaded(bool),
    /// Return value of one invocation.
    Response(Value),
    /// Failure of one invocation, when failures are reported rather than
    /// fatal.
    Error(String),
    /// Trace line for an honoured request.
    Log {
        /// Trace text.
        message: String,
        /// RFC 3339 timestamp.
        time: String,
    },
}

impl OutboundMessage {
    /// Returns the `type` tag written on the wire.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Started => STARTED,
            Self::FunctionLoaded(_) => FUNCTION_LOADED,
            Self::Response(_) => RESPONSE,
            Self::Error(_) => ERROR,
            Self::Log { .. } => LOG,
        }
    }
}

impl From<OutboundMessage> for Envelope {
    fn from(message: OutboundMessage) -> Self {
        let kind = message.kind();
        match message {
            OutboundMessage::Started => Self::new(kind, Value::String(String::new())),
            OutboundMessage::FunctionLoaded(loaded) => Self::new(kind, Value::Bool(loaded)),
            OutboundMessage::Response(data) => Self::new(kind, data),
            OutboundMessage::Error(message) => Self::new(kind, Value::String(message)),
            OutboundMessage::Log { message, time } => {
                Self::new(kind, Value::String(message)).with_time(time)
            }
        }
    }
}
