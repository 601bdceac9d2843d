//! Wire protocol and line channel for the function worker.
//!
//! The worker talks to its orchestrator over two byte streams. Every message
//! in either direction is one JSON object of the form
//! `{"type": <string>, "data": <any>}` on its own `\n`-terminated line.
//!
//! [`message`] owns the typed view of those objects and [`channel`] owns the
//! framing: splitting the input stream into lines, handing each line to the
//! subscribed handler in arrival order, and writing each outbound message as
//! a single line.

pub mod channel;
pub mod error;
pub mod message;

pub use self::channel::{ChannelExit, Delivery, Emitter, LineHandler, MessageChannel};
pub use self::error::{ChannelError, MessageError};
pub use self::message::{Envelope, InboundMessage, OutboundMessage};
