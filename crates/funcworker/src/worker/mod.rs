//! The worker's two-state protocol handler.
//!
//! A worker starts in [`WorkerState::Loading`], where it only listens for
//! `function` messages. The first source that converts successfully fills
//! the function slot and moves the worker to [`WorkerState::Serving`] for the
//! rest of the process lifetime; from then on only `request` messages are
//! honoured. Lines that are not valid messages are logged and skipped in
//! either state.

use std::fmt;
use std::io::{BufRead, Write};

use funcworker_config::{Config, InvocationFailurePolicy};
use funcworker_loader::{ConversionError, FunctionLoader, Invocable, InvocationError};
use funcworker_protocol::{
    Delivery, Emitter, InboundMessage, LineHandler, MessageChannel, OutboundMessage,
};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::{debug, info, warn};

use crate::error::WorkerError;

/// Tracing target for worker state transitions and dispatch.
pub const WORKER_TARGET: &str = "funcworker::worker";

/// Behaviour switches taken from configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WorkerOptions {
    /// Reaction to a failing invocation.
    pub on_invoke_error: InvocationFailurePolicy,
    /// Emit a `log` line before each honoured request.
    pub request_logging: bool,
}

impl WorkerOptions {
    /// Extracts the worker switches from a resolved configuration.
    #[must_use]
    pub const fn from_config(config: &Config) -> Self {
        Self {
            on_invoke_error: config.on_invoke_error(),
            request_logging: config.request_logging(),
        }
    }
}

/// Source of timestamps for request log lines.
pub trait Clock {
    /// Returns the current time as an RFC 3339 string.
    ///
    /// # Errors
    ///
    /// Returns the formatter's error if the time cannot be rendered.
    fn now_rfc3339(&self) -> Result<String, time::error::Format>;
}

/// Wall-clock time in UTC.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_rfc3339(&self) -> Result<String, time::error::Format> {
        OffsetDateTime::now_utc().format(&Rfc3339)
    }
}

/// Holds the one function a worker ever serves.
pub struct FunctionSlot {
    unit: Box<dyn Invocable>,
}

impl FunctionSlot {
    /// Wraps a loaded function.
    #[must_use]
    pub const fn new(unit: Box<dyn Invocable>) -> Self {
        Self { unit }
    }

    /// Calls the held function.
    ///
    /// # Errors
    ///
    /// Propagates the function's [`InvocationError`].
    pub fn invoke(&self, argument: &Value) -> Result<Value, InvocationError> {
        self.unit.invoke(argument)
    }
}

impl fmt::Debug for FunctionSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionSlot").finish_non_exhaustive()
    }
}

/// Protocol phase of a worker.
#[derive(Debug, Default)]
pub enum WorkerState {
    /// Waiting for a `function` message that converts successfully.
    #[default]
    Loading,
    /// Answering `request` messages with the loaded function.
    Serving(FunctionSlot),
}

impl WorkerState {
    /// Returns `true` until a function has been loaded.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Short name used in diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Serving(_) => "serving",
        }
    }
}

/// Protocol handler that loads one function and then serves requests.
#[derive(Debug)]
pub struct Worker<L, C = SystemClock> {
    loader: L,
    options: WorkerOptions,
    clock: C,
    state: WorkerState,
}

impl<L: FunctionLoader> Worker<L> {
    /// Creates a worker in the loading state using the system clock.
    #[must_use]
    pub const fn new(loader: L, options: WorkerOptions) -> Self {
        Self::with_clock(loader, options, SystemClock)
    }
}

impl<L: FunctionLoader, C: Clock> Worker<L, C> {
    /// Creates a worker in the loading state with an explicit clock.
    #[must_use]
    pub const fn with_clock(loader: L, options: WorkerOptions, clock: C) -> Self {
        Self {
            loader,
            options,
            clock,
            state: WorkerState::Loading,
        }
    }

    /// Returns the current protocol phase.
    #[must_use]
    pub const fn state(&self) -> &WorkerState {
        &self.state
    }

    /// Handles one input line, emitting at most one protocol reply (plus a
    /// request log line when enabled).
    ///
    /// # Errors
    ///
    /// Returns [`WorkerError::Channel`] when a reply cannot be written,
    /// [`WorkerError::Invocation`] when a request fails under the `crash`
    /// policy and [`WorkerError::Timestamp`] when a request log line cannot
    /// be stamped.
    pub fn handle_line<W: Write>(
        &mut self,
        line: &str,
        emitter: &mut Emitter<W>,
    ) -> Result<(), WorkerError> {
        let message = match InboundMessage::parse(line) {
            Ok(message) => message,
            Err(error) => {
                warn!(
                    target: WORKER_TARGET,
                    state = self.state.name(),
                    %error,
                    "ignoring malformed line"
                );
                return Ok(());
            }
        };

        match message {
            InboundMessage::Function(source) if self.state.is_loading() => {
                self.load(&source, emitter)
            }
            InboundMessage::Request(argument) if !self.state.is_loading() => {
                self.serve(&argument, emitter)
            }
            other => {
                debug!(
                    target: WORKER_TARGET,
                    state = self.state.name(),
                    kind = other.kind(),
                    "ignoring message"
                );
                Ok(())
            }
        }
    }

    fn load<W: Write>(
        &mut self,
        source: &Value,
        emitter: &mut Emitter<W>,
    ) -> Result<(), WorkerError> {
        let converted = source
            .as_str()
            .ok_or_else(|| ConversionError::non_text(source))
            .and_then(|text| self.loader.load(text));

        match converted {
            Ok(unit) => {
                self.state = WorkerState::Serving(FunctionSlot::new(unit));
                info!(target: WORKER_TARGET, "function loaded, serving requests");
                emitter.emit(&OutboundMessage::FunctionLoaded(true))?;
            }
            Err(error) => {
                info!(target: WORKER_TARGET, %error, "function failed to load");
                emitter.emit(&OutboundMessage::FunctionLoaded(false))?;
            }
        }
        Ok(())
    }

    fn serve<W: Write>(
        &self,
        argument: &Value,
        emitter: &mut Emitter<W>,
    ) -> Result<(), WorkerError> {
        let WorkerState::Serving(slot) = &self.state else {
            return Ok(());
        };

        if self.options.request_logging {
            let time = self
                .clock
                .now_rfc3339()
                .map_err(|source| WorkerError::Timestamp { source })?;
            emitter.emit(&OutboundMessage::Log {
                message: format!("received request: {argument}"),
                time,
            })?;
        }

        match slot.invoke(argument) {
            Ok(result) => emitter.emit(&OutboundMessage::Response(result))?,
            Err(error) => match self.options.on_invoke_error {
                InvocationFailurePolicy::Crash => {
                    return Err(WorkerError::Invocation { source: error });
                }
                InvocationFailurePolicy::Report => {
                    warn!(target: WORKER_TARGET, %error, "request failed, reporting");
                    emitter.emit(&OutboundMessage::Error(error.to_string()))?;
                }
            },
        }
        Ok(())
    }
}

impl<L, C, W> LineHandler<W> for Worker<L, C>
where
    L: FunctionLoader,
    C: Clock,
    W: Write,
{
    type Error = WorkerError;

    fn on_line(&mut self, line: &str, emitter: &mut Emitter<W>) -> Result<Delivery, WorkerError> {
        self.handle_line(line, emitter)?;
        Ok(Delivery::Continue)
    }
}

/// Announces the worker and feeds it every input line until input ends.
///
/// `started` is written before anything is read.
///
/// # Errors
///
/// Returns the first fatal [`WorkerError`].
pub fn run_worker<L, C>(
    stdin: &mut impl BufRead,
    stdout: &mut impl Write,
    worker: Worker<L, C>,
) -> Result<(), WorkerError>
where
    L: FunctionLoader,
    C: Clock,
{
    let mut channel = MessageChannel::new(stdin, stdout);
    channel.emit(&OutboundMessage::Started)?;
    channel.subscribe(worker);
    let exit = channel.run()?;
    debug!(target: WORKER_TARGET, ?exit, "protocol loop finished");
    Ok(())
}
