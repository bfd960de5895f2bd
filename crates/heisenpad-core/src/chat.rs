//! Message reducer.
//!
//! Folds commands into an ordered, deduplicated message list. Order is the
//! order in which ids were first seen by *this* observer; a `put` for a
//! known id replaces the message in place and never moves it.
//!
//! Stored messages keep their wire form. Decryption happens at read time in
//! the session layer, so a passphrase change re-renders history without
//! touching this state.

use heisenpad_proto::{Command, Message};

/// Ordered message collection for one channel.
///
/// # Invariants
///
/// - Ids are unique
/// - Relative order of retained messages never changes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatState {
    messages: Vec<Message>,
}

impl ChatState {
    /// Empty chat.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one command. Returns whether the state changed.
    ///
    /// - `put` replaces the message with the same id in place, or appends
    /// - `delete` removes the message with that id; unknown ids are a no-op
    /// - `ping` never changes anything
    pub fn apply(&mut self, command: &Command) -> bool {
        let changed = match command {
            Command::Ping => false,
            Command::Put { message } => {
                match self.messages.iter_mut().find(|m| m.id == message.id) {
                    Some(existing) if existing == message => false,
                    Some(existing) => {
                        *existing = message.clone();
                        true
                    },
                    None => {
                        self.messages.push(message.clone());
                        true
                    },
                }
            },
            Command::Delete { id } => {
                let before = self.messages.len();
                self.messages.retain(|m| &m.id != id);
                self.messages.len() != before
            },
        };

        debug_assert!(self.ids_are_unique());
        changed
    }

    /// Messages in display order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Message with this id, if present.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether there are no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop all messages. Used when switching channels.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    fn ids_are_unique(&self) -> bool {
        let mut seen = std::collections::HashSet::with_capacity(self.messages.len());
        self.messages.iter().all(|m| seen.insert(m.id.as_str()))
    }
}

/// Pure reducer form of [`ChatState::apply`].
#[must_use]
pub fn reduce(mut state: ChatState, command: &Command) -> ChatState {
    state.apply(command);
    state
}
