//! Commands and messages.
//!
//! The JSON shape is fixed by deployed clients, so the serde attributes here
//! are part of the wire contract. `Command` is internally tagged on the
//! `"command"` key and its variant names are lowercase.

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// A chat message as it travels on the wire.
///
/// Identity is `id`: a `put` with an existing id replaces the message in
/// place. `content` is ciphertext when `encrypted` is set and plaintext
/// otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    /// Unique message id, generated by the authoring client.
    pub id: String,
    /// Anonymous participant id of the author.
    pub user: String,
    /// Plaintext or hex ciphertext.
    pub content: String,
    /// Whether `content` is ciphertext.
    #[serde(default)]
    pub encrypted: bool,
}

/// One protocol command. Exactly one per transport frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Command {
    /// Liveness probe. Carries no payload and never mutates chat state.
    Ping,

    /// Create or replace the message with `message.id`.
    Put {
        /// Full message value; every field overwrites the previous one.
        message: Message,
    },

    /// Remove the message with this id, if present.
    Delete {
        /// Id of the message to remove.
        id: String,
    },
}

impl Command {
    /// Serialize into a single text frame.
    pub fn to_frame(&self) -> String {
        let Ok(frame) = serde_json::to_string(self) else {
            unreachable!("commands contain only strings and booleans");
        };
        frame
    }

    /// Parse a single text frame.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Json` if the frame is not JSON or not a known command
    /// - `ProtocolError::EmptyField` if a message or delete id is empty
    pub fn from_frame(frame: &str) -> Result<Self> {
        let command: Self = serde_json::from_str(frame)?;

        match &command {
            Self::Ping => {},
            Self::Put { message } if message.id.is_empty() => {
                return Err(ProtocolError::EmptyField { field: "message.id" });
            },
            Self::Put { .. } => {},
            Self::Delete { id } if id.is_empty() => {
                return Err(ProtocolError::EmptyField { field: "id" });
            },
            Self::Delete { .. } => {},
        }

        Ok(command)
    }

    /// Whether this command can change chat state.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, Self::Ping)
    }

    /// Wire tag of this command, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ping => "ping",
            Self::Put { .. } => "put",
            Self::Delete { .. } => "delete",
        }
    }
}
