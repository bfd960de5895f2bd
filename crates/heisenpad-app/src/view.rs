//! Read-only views for the presentation layer.
//!
//! Views are rebuilt on every read. Decrypted text exists only inside a view
//! value and is never written back into session state, so clearing the
//! passphrase re-locks every encrypted message on the next read.

use heisenpad_core::ConnectionState;
use heisenpad_proto::{Channel, Message};

/// Displayable body of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    /// Sent without encryption.
    Plain(String),
    /// Encrypted, decrypted with the current passphrase. Garbled if the
    /// passphrase differs from the author's.
    Unlocked(String),
    /// Encrypted and no passphrase is set.
    Locked,
}

impl MessageBody {
    /// Text to display. `None` while locked.
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Plain(text) | Self::Unlocked(text) => Some(text),
            Self::Locked => None,
        }
    }

    /// Whether the message is still encrypted for this reader.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked)
    }
}

/// One message as the presentation layer sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    /// Message id.
    pub id: String,
    /// Author participant id.
    pub user: String,
    /// Authored by this session's participant.
    pub is_own: bool,
    /// Decrypted (or locked) body.
    pub body: MessageBody,
    /// Wire form, suitable for [`crate::SessionRequest::Resend`].
    pub message: Message,
}

/// Everything a presentation layer renders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Current channel.
    pub channel: Channel,
    /// Current connection state.
    pub connection: ConnectionState,
    /// Whether a passphrase is set.
    pub keyed: bool,
    /// This session's anonymous participant id.
    pub participant_id: String,
    /// Messages in display order.
    pub messages: Vec<MessageView>,
}

impl SessionSnapshot {
    /// Whether the send affordance should be enabled.
    pub fn can_send(&self) -> bool {
        self.connection == ConnectionState::Open
    }

    /// Message view by id.
    pub fn message(&self, id: &str) -> Option<&MessageView> {
        self.messages.iter().find(|m| m.id == id)
    }
}
