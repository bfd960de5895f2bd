//! Heisenpad wire protocol
//!
//! Every transport frame is UTF-8 text carrying exactly one JSON-encoded
//! [`Command`]. There is no framing beyond one command per frame and no
//! batching. Commands are the only mutation vocabulary on the wire: a
//! [`Command::Put`] creates or replaces a [`Message`] by id, a
//! [`Command::Delete`] removes one, and [`Command::Ping`] keeps the transport
//! alive.
//!
//! ```text
//! {"command":"ping"}
//! {"command":"put","message":{"id":"..","user":"..","content":"..","encrypted":false}}
//! {"command":"delete","id":".."}
//! ```
//!
//! Channels scope both connections and messages. Channel identifiers are
//! percent-encoded before they appear in any address (see [`Channel`]).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod channel;
mod command;
pub mod errors;

pub use channel::{Channel, DEFAULT_CHANNEL};
pub use command::{Command, Message};
pub use errors::{ProtocolError, Result};
