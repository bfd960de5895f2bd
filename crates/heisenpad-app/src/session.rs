//! Session coordinator.
//!
//! This module defines [`Session`], which wires the cipher, the connection
//! state machine and the message reducer together for the active channel.
//!
//! This is a pure state machine: it consumes entry-point calls and
//! [`crate::SessionEvent`] inputs and produces [`crate::SessionAction`]
//! instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Owns exactly one connection and one chat state at a time, both replaced
//!   wholesale on channel change.
//! - Encrypts outbound text when a passphrase is set.
//! - Decrypts on every read of the message view, never storing plaintext.
//! - Tags transport actions with a generation and drops stale events.

use heisenpad_core::{
    ChatState, Connection, ConnectionAction, ConnectionError, ConnectionState, Environment,
};
use heisenpad_crypto::{CipherContext, NONCE_SIZE};
use heisenpad_proto::{Channel, Command, Message};

use crate::{MessageBody, MessageView, SessionAction, SessionConfig, SessionEvent, SessionSnapshot};

/// Session state machine.
///
/// Constructed once per client run. Each [`Session::join`] starts a fresh
/// connection generation with empty chat state; nothing carries over from
/// the previous channel except the participant id and the passphrase.
pub struct Session<E: Environment> {
    /// Time and randomness
    env: E,
    /// Configuration
    config: SessionConfig,
    /// Anonymous participant id, stable for the session lifetime
    participant_id: String,
    /// Current channel
    channel: Channel,
    /// Current passphrase. Empty disables encryption.
    passphrase: String,
    /// Derived from `passphrase` and `channel`. `None` while unkeyed.
    cipher: Option<CipherContext>,
    /// Messages of the current channel
    chat: ChatState,
    /// Transport lifecycle of the current channel
    connection: Connection<E::Instant>,
    /// Bumped on every join
    generation: u64,
}

impl<E: Environment> Session<E> {
    /// Create a session. Nothing connects until [`Session::start`].
    pub fn new(env: E, config: SessionConfig) -> Self {
        let participant_id = env.random_id();
        let channel = config.channel.clone();
        let connection = Connection::new(config.transport_url(&channel), config.connection.clone());

        tracing::debug!(%participant_id, %channel, "session created");

        Self {
            env,
            config,
            participant_id,
            channel,
            passphrase: String::new(),
            cipher: None,
            chat: ChatState::new(),
            connection,
            generation: 0,
        }
    }

    /// Join the configured channel.
    pub fn start(&mut self) -> Vec<SessionAction> {
        let channel = self.channel.clone();
        self.join(channel)
    }

    /// Switch to `channel`.
    ///
    /// Tears down the current connection, clears chat state, re-derives the
    /// cipher for the new channel and opens a new connection scoped to it.
    pub fn join(&mut self, channel: Channel) -> Vec<SessionAction> {
        let teardown = self.connection.close();
        let mut actions = self.lift(teardown);

        self.chat.clear();
        self.channel = channel;
        self.cipher = CipherContext::derive(&self.passphrase, self.channel.as_encoded());
        self.generation += 1;
        self.connection = Connection::new(
            self.config.transport_url(&self.channel),
            self.config.connection.clone(),
        );

        let Ok(connect) = self.connection.connect() else {
            unreachable!("a fresh connection is always uninstantiated");
        };

        tracing::info!(channel = %self.channel, generation = self.generation, "joining channel");

        actions.extend(self.lift(connect));
        actions.push(SessionAction::Render);
        actions
    }

    /// Replace the passphrase. Empty disables encryption.
    ///
    /// Existing messages are not touched; the next read of the view decrypts
    /// (or locks) them with the new context.
    pub fn set_passphrase(&mut self, passphrase: impl Into<String>) -> Vec<SessionAction> {
        self.passphrase = passphrase.into();
        self.cipher = CipherContext::derive(&self.passphrase, self.channel.as_encoded());

        tracing::debug!(keyed = self.cipher.is_some(), "passphrase changed");
        vec![SessionAction::Render]
    }

    /// Send a text message.
    ///
    /// The text is trimmed; nothing is sent if that leaves it empty. Sends
    /// are dropped silently unless the connection is open. The local chat
    /// state only changes when the relay echoes the command back.
    pub fn send_text(&mut self, text: &str) -> Vec<SessionAction> {
        let text = text.trim();
        if text.is_empty() {
            return vec![];
        }

        let (content, encrypted) = match &self.cipher {
            Some(cipher) => {
                let mut nonce = [0u8; NONCE_SIZE];
                self.env.random_bytes(&mut nonce);
                (cipher.encrypt(text, nonce), true)
            },
            None => (text.to_string(), false),
        };

        let message =
            Message { id: self.env.random_id(), user: self.participant_id.clone(), content, encrypted };

        self.send(&Command::Put { message })
    }

    /// Delete a message by id.
    pub fn delete_message(&mut self, id: impl Into<String>) -> Vec<SessionAction> {
        self.send(&Command::Delete { id: id.into() })
    }

    /// Re-send `message` verbatim as a new `put` with the same id.
    pub fn resend(&mut self, message: &Message) -> Vec<SessionAction> {
        self.send(&Command::Put { message: message.clone() })
    }

    /// Manual reconnect.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` unless the connection is closed
    pub fn reconnect(&mut self) -> Result<Vec<SessionAction>, ConnectionError> {
        let connect = self.connection.connect()?;
        let mut actions = self.lift(connect);
        actions.push(SessionAction::Render);
        Ok(actions)
    }

    /// Deliberate teardown. Discards chat state.
    pub fn leave(&mut self) -> Vec<SessionAction> {
        let teardown = self.connection.close();
        let mut actions = self.lift(teardown);
        self.chat.clear();
        actions.push(SessionAction::Render);
        actions
    }

    /// Process a transport event or tick.
    pub fn handle(&mut self, event: SessionEvent, now: E::Instant) -> Vec<SessionAction> {
        if let Some(generation) = event.generation()
            && generation != self.generation
        {
            tracing::debug!(generation, current = self.generation, "ignoring stale transport event");
            return vec![];
        }

        match event {
            SessionEvent::TransportOpened { .. } => {
                let opened = self.connection.handle_open(now);
                self.lift_with_render(opened)
            },
            SessionEvent::TransportClosed { reason, .. } => {
                let closed = self.connection.handle_close(now, &reason);
                self.lift_with_render(closed)
            },
            SessionEvent::FrameReceived { frame, .. } => {
                let Some(command) = self.connection.receive(&frame) else {
                    return vec![];
                };

                if self.chat.apply(&command) {
                    vec![SessionAction::Render]
                } else {
                    vec![]
                }
            },
            SessionEvent::Tick => {
                let before = self.connection.state();
                let actions = self.connection.tick(now);
                let mut actions = self.lift(actions);
                if self.connection.state() != before {
                    actions.push(SessionAction::Render);
                }
                actions
            },
        }
    }

    /// Decrypted view of the current channel, in display order.
    ///
    /// Decrypts on every call.
    pub fn messages(&self) -> Vec<MessageView> {
        self.chat
            .messages()
            .iter()
            .map(|message| MessageView {
                id: message.id.clone(),
                user: message.user.clone(),
                is_own: message.user == self.participant_id,
                body: self.body_of(message),
                message: message.clone(),
            })
            .collect()
    }

    /// Everything the presentation layer renders.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            channel: self.channel.clone(),
            connection: self.connection.state(),
            keyed: self.is_keyed(),
            participant_id: self.participant_id.clone(),
            messages: self.messages(),
        }
    }

    /// Anonymous participant id.
    pub fn participant_id(&self) -> &str {
        &self.participant_id
    }

    /// Current channel.
    pub fn channel(&self) -> &Channel {
        &self.channel
    }

    /// Current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Whether a passphrase is set.
    pub fn is_keyed(&self) -> bool {
        self.cipher.is_some()
    }

    /// Current connection generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Raw (wire form) chat state.
    pub fn chat(&self) -> &ChatState {
        &self.chat
    }

    /// Time until the connection's next timer fires.
    pub fn time_until_next_timer(&self, now: E::Instant) -> Option<std::time::Duration> {
        self.connection.time_until_next_timer(now)
    }

    /// Environment handle.
    pub fn env(&self) -> &E {
        &self.env
    }

    fn body_of(&self, message: &Message) -> MessageBody {
        if !message.encrypted {
            return MessageBody::Plain(message.content.clone());
        }

        match &self.cipher {
            Some(cipher) => MessageBody::Unlocked(cipher.decrypt(&message.content)),
            None => MessageBody::Locked,
        }
    }

    fn send(&self, command: &Command) -> Vec<SessionAction> {
        let actions = self.connection.send(command);
        self.lift(actions)
    }

    fn lift_with_render(&self, actions: Vec<ConnectionAction>) -> Vec<SessionAction> {
        let mut actions = self.lift(actions);
        actions.push(SessionAction::Render);
        actions
    }

    /// Tag connection actions with the current generation.
    fn lift(&self, actions: Vec<ConnectionAction>) -> Vec<SessionAction> {
        let generation = self.generation;
        actions
            .into_iter()
            .map(|action| match action {
                ConnectionAction::Connect { url } => SessionAction::Connect { generation, url },
                ConnectionAction::SendFrame(frame) => SessionAction::Send { generation, frame },
                ConnectionAction::Disconnect => SessionAction::Disconnect { generation },
            })
            .collect()
    }
}

impl<E: Environment> std::fmt::Debug for Session<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("participant_id", &self.participant_id)
            .field("channel", &self.channel)
            .field("keyed", &self.cipher.is_some())
            .field("connection", &self.connection.state())
            .field("generation", &self.generation)
            .field("messages", &self.chat.len())
            .finish_non_exhaustive()
    }
}
