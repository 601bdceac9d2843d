//! Line framing between the worker and its orchestrator.
//!
//! [`MessageChannel`] splits the input stream into `\n`-terminated lines and
//! hands each one, in arrival order, to the single subscribed
//! [`LineHandler`]. Handlers write replies through an [`Emitter`], which
//! turns each [`OutboundMessage`] into exactly one line and flushes it with a
//! single write so replies never interleave.
//!
//! The channel does not interpret lines. Bytes that are not valid UTF-8 are
//! decoded lossily and still delivered; deciding whether a line is a valid
//! message belongs to the handler.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::error::ChannelError;
use crate::message::OutboundMessage;

/// Tracing target for channel operations.
const CHANNEL_TARGET: &str = "funcworker::channel";

/// What the channel should do with a handler after it consumed a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Keep delivering subsequent lines to the same handler.
    Continue,
    /// Detach the handler before the next line is read.
    Detach,
}

/// Why [`MessageChannel::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelExit {
    /// The input stream was closed.
    EndOfInput,
    /// No handler remained subscribed.
    Detached,
}

/// Receives lines from a [`MessageChannel`].
pub trait LineHandler<W: Write> {
    /// Error type surfaced through [`MessageChannel::run`].
    type Error: From<ChannelError>;

    /// Handles one line, without its trailing `\n` or `\r\n`.
    ///
    /// # Errors
    ///
    /// Any error stops the channel and is returned from
    /// [`MessageChannel::run`] unchanged.
    fn on_line(&mut self, line: &str, emitter: &mut Emitter<W>) -> Result<Delivery, Self::Error>;
}

/// Writes outbound messages as single JSONL lines.
#[derive(Debug)]
pub struct Emitter<W> {
    writer: W,
}

impl<W: Write> Emitter<W> {
    /// Wraps an output stream.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Serialises `message` and writes it as one newline-terminated line.
    ///
    /// The line is assembled in memory first and written with one call, then
    /// the stream is flushed so the orchestrator sees it immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelError::Serialize`] if the message cannot be encoded
    /// and [`ChannelError::Write`] if writing or flushing fails.
    pub fn emit(&mut self, message: &OutboundMessage) -> Result<(), ChannelError> {
        let mut line = serde_json::to_vec(message).map_err(ChannelError::serialize)?;
        line.push(b'\n');
        self.writer
            .write_all(&line)
            .map_err(ChannelError::write)?;
        self.writer.flush().map_err(ChannelError::write)
    }

    /// Returns the wrapped stream.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Delivers input lines to one subscribed handler at a time.
///
/// # Example
///
/// ```
/// use std::io::{Cursor, Write};
///
/// use funcworker_protocol::{
///     ChannelError, ChannelExit, Delivery, Emitter, LineHandler, MessageChannel,
///     OutboundMessage,
/// };
///
/// struct Echo;
///
/// impl<W: Write> LineHandler<W> for Echo {
///     type Error = ChannelError;
///
///     fn on_line(&mut self, line: &str, emitter: &mut Emitter<W>) -> Result<Delivery, ChannelError> {
///         emitter.emit(&OutboundMessage::Response(serde_json::json!(line)))?;
///         Ok(Delivery::Continue)
///     }
/// }
///
/// let mut channel = MessageChannel::new(Cursor::new("hello\n"), Vec::new());
/// channel.subscribe(Echo);
/// let exit = channel.run().expect("in-memory streams do not fail");
/// assert_eq!(exit, ChannelExit::EndOfInput);
/// ```
#[derive(Debug)]
pub struct MessageChannel<R, W, H> {
    reader: R,
    emitter: Emitter<W>,
    handler: Option<H>,
}

impl<R, W, H> MessageChannel<R, W, H>
where
    R: BufRead,
    W: Write,
    H: LineHandler<W>,
{
    /// Creates a channel with no handler subscribed.
    pub const fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            emitter: Emitter::new(writer),
            handler: None,
        }
    }

    /// Makes `handler` the active handler, returning the one it replaces.
    pub fn subscribe(&mut self, handler: H) -> Option<H> {
        self.handler.replace(handler)
    }

    /// Detaches the active handler so it receives no further lines.
    pub fn stop(&mut self) -> Option<H> {
        let detached = self.handler.take();
        if detached.is_some() {
            debug!(target: CHANNEL_TARGET, "line handler detached");
        }
        detached
    }

    /// Writes one message to the output stream.
    ///
    /// # Errors
    ///
    /// See [`Emitter::emit`].
    pub fn emit(&mut self, message: &OutboundMessage) -> Result<(), ChannelError> {
        self.emitter.emit(message)
    }

    /// Delivers lines to the active handler until input ends or no handler
    /// is left.
    ///
    /// Lines are delivered strictly one at a time; the next line is not read
    /// until the handler has returned for the previous one.
    ///
    /// # Errors
    ///
    /// Returns read failures as [`ChannelError::Read`] converted into the
    /// handler's error type, and any error the handler returns.
    pub fn run(&mut self) -> Result<ChannelExit, H::Error> {
        let mut buffer = Vec::new();
        loop {
            let Some(handler) = self.handler.as_mut() else {
                return Ok(ChannelExit::Detached);
            };

            buffer.clear();
            let bytes_read = self
                .reader
                .read_until(b'\n', &mut buffer)
                .map_err(ChannelError::read)?;
            if bytes_read == 0 {
                debug!(target: CHANNEL_TARGET, "input stream closed");
                return Ok(ChannelExit::EndOfInput);
            }

            let decoded = String::from_utf8_lossy(&buffer);
            let delivery = handler.on_line(strip_terminator(&decoded), &mut self.emitter)?;
            if delivery == Delivery::Detach {
                self.stop();
            }
        }
    }

    /// Splits the channel into its streams and the active handler.
    pub fn into_parts(self) -> (R, W, Option<H>) {
        (self.reader, self.emitter.into_inner(), self.handler)
    }
}

fn strip_terminator(line: &str) -> &str {
    let without_newline = line.strip_suffix('\n').unwrap_or(line);
    without_newline
        .strip_suffix('\r')
        .unwrap_or(without_newline)
}
