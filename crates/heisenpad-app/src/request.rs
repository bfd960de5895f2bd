//! Presentation-facing requests.

use heisenpad_proto::{Channel, Message};

/// Requests a presentation layer can make of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRequest {
    /// Switch to another channel.
    Join(Channel),
    /// Replace the passphrase. Empty disables encryption.
    SetPassphrase(String),
    /// Send a text message.
    SendText(String),
    /// Delete a message by id.
    Delete(String),
    /// Re-send an existing message verbatim.
    Resend(Message),
    /// Manual reconnect after the automatic budget ran out.
    Reconnect,
    /// Tear down and stop the runtime.
    Shutdown,
}
