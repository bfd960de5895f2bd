//! Connection lifecycle state machine.
//!
//! Manages connect, keepalive, bounded auto-reconnect and manual recovery for
//! one channel's transport. Uses the action pattern: methods take time as
//! input and return actions for the driver to execute. This keeps the state
//! machine pure (no I/O) and makes the timing rules testable without sleeping.
//!
//! # State Machine
//!
//! ```text
//!                   connect()
//! ┌────────────────┐        ┌────────────┐  open   ┌──────┐
//! │ Uninstantiated │───────>│ Connecting │────────>│ Open │
//! └────────────────┘        └────────────┘<────────└──────┘
//!                             │  ^   │    drop, attempts left
//!            attempts exhausted  │   │ close()        │ close()
//!                             │  │   ↓                ↓
//!                             │  │ ┌─────────┐ closed ┌────────┐
//!                             │  │ │ Closing │───────>│ Closed │
//!                             │  │ └─────────┘        └────────┘
//!                             │  └── connect() (manual) ──┘ ^
//!                             └─────────────────────────────┘
//! ```
//!
//! # Timers
//!
//! The keepalive and the pending reconnect are the only timers. Both are
//! stored as start instants on this struct and evaluated by [`Connection::tick`],
//! so they are cancelled simply by clearing the field, and they cannot outlive
//! the instance that owns them.

use std::{
    ops::Sub,
    time::{Duration, Instant},
};

use heisenpad_proto::Command;

use crate::error::ConnectionError;

/// Interval at which the connection sends Ping commands while open.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Delay before each automatic reconnect attempt.
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(3);

/// Consecutive automatic reconnect attempts before settling at `Closed`.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Actions returned by the connection state machine.
///
/// The driver executes these actions:
/// - `Connect`: Open a new transport to `url`, then report open or close
/// - `SendFrame`: Send the text frame over the open transport
/// - `Disconnect`: Close the transport, then report close
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionAction {
    /// Open a transport to this address
    Connect {
        /// Transport address, already scoped to the channel
        url: String,
    },

    /// Send this text frame to the peer
    SendFrame(String),

    /// Close the transport
    Disconnect,
}

/// Connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    /// Created, never asked to connect
    Uninstantiated,
    /// Transport being opened, or waiting to retry
    Connecting,
    /// Transport open; keepalive running
    Open,
    /// Deliberate teardown in progress
    Closing,
    /// Closed; only a manual connect leaves this state
    Closed,
}

/// Connection configuration
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Keepalive period while open
    pub heartbeat_interval: Duration,
    /// Fixed delay before each automatic reconnect attempt
    pub reconnect_interval: Duration,
    /// Automatic attempts allowed after an unexpected drop
    pub max_reconnect_attempts: u32,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_interval: DEFAULT_RECONNECT_INTERVAL,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

/// Connection state machine
///
/// Manages lifecycle, keepalive and reconnects for a single transport
/// address. This is a pure state machine - no I/O, no clock reads. Time is
/// passed as parameters to methods that need it.
///
/// Generic over `Instant` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug, Clone)]
pub struct Connection<I = Instant>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Current state
    state: ConnectionState,
    /// Configuration
    config: ConnectionConfig,
    /// Transport address
    url: String,
    /// Automatic attempts since the last `Open -> non-Open` transition
    reconnect_attempts: u32,
    /// Last keepalive sent. `Some` only while open.
    last_heartbeat: Option<I>,
    /// When the pending reconnect was scheduled. `Some` only while waiting.
    retry_scheduled_at: Option<I>,
}

impl<I> Connection<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a new connection in [`ConnectionState::Uninstantiated`] state
    pub fn new(url: impl Into<String>, config: ConnectionConfig) -> Self {
        Self {
            state: ConnectionState::Uninstantiated,
            config,
            url: url.into(),
            reconnect_attempts: 0,
            last_heartbeat: None,
            retry_scheduled_at: None,
        }
    }

    /// Current connection state
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Whether commands sent now would be transmitted.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    /// Transport address
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Automatic reconnect attempts consumed since the last successful open.
    #[must_use]
    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_attempts
    }

    /// Whether an automatic reconnect is scheduled but not yet started.
    #[must_use]
    pub fn is_retry_pending(&self) -> bool {
        self.retry_scheduled_at.is_some()
    }

    /// Connection configuration
    #[must_use]
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Start connecting.
    ///
    /// This is both the initial connect and the manual recovery trigger: it
    /// is the only way out of [`ConnectionState::Closed`]. Resets the
    /// reconnect budget.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` unless `Uninstantiated` or `Closed`
    pub fn connect(&mut self) -> Result<Vec<ConnectionAction>, ConnectionError> {
        match self.state {
            ConnectionState::Uninstantiated | ConnectionState::Closed => {
                tracing::debug!(url = %self.url, from = ?self.state, "connecting");
                self.state = ConnectionState::Connecting;
                self.reconnect_attempts = 0;
                self.retry_scheduled_at = None;
                Ok(vec![ConnectionAction::Connect { url: self.url.clone() }])
            },
            state => Err(ConnectionError::InvalidState { state, operation: "connect" }),
        }
    }

    /// Transport reports it is open.
    ///
    /// Resets the reconnect budget, starts the keepalive and sends the first
    /// ping immediately.
    pub fn handle_open(&mut self, now: I) -> Vec<ConnectionAction> {
        if self.state != ConnectionState::Connecting || self.retry_scheduled_at.is_some() {
            tracing::debug!(state = ?self.state, "ignoring open outside of a connect attempt");
            return vec![];
        }

        tracing::debug!(url = %self.url, "open");
        self.state = ConnectionState::Open;
        self.reconnect_attempts = 0;
        self.last_heartbeat = Some(now);

        vec![ConnectionAction::SendFrame(Command::Ping.to_frame())]
    }

    /// Transport reports it closed, or that a connect attempt failed.
    ///
    /// A close during deliberate teardown completes it. Any other close of a
    /// live transport schedules an automatic retry while the budget lasts,
    /// then settles at [`ConnectionState::Closed`].
    pub fn handle_close(&mut self, now: I, reason: &str) -> Vec<ConnectionAction> {
        self.last_heartbeat = None;

        match self.state {
            ConnectionState::Closing => {
                tracing::debug!(url = %self.url, "closed");
                self.state = ConnectionState::Closed;
            },
            ConnectionState::Open | ConnectionState::Connecting
                if self.retry_scheduled_at.is_none() =>
            {
                if self.reconnect_attempts < self.config.max_reconnect_attempts {
                    self.reconnect_attempts += 1;
                    self.state = ConnectionState::Connecting;
                    self.retry_scheduled_at = Some(now);
                    tracing::warn!(
                        url = %self.url,
                        %reason,
                        attempt = self.reconnect_attempts,
                        "transport lost, scheduling reconnect"
                    );
                } else {
                    self.state = ConnectionState::Closed;
                    tracing::warn!(
                        url = %self.url,
                        %reason,
                        attempts = self.reconnect_attempts,
                        "reconnect attempts exhausted"
                    );
                }
            },
            state => {
                tracing::debug!(?state, %reason, "ignoring close without a live transport");
            },
        }

        vec![]
    }

    /// Deliberate teardown.
    ///
    /// Cancels both timers. A live (or opening) transport moves to
    /// [`ConnectionState::Closing`] and is asked to disconnect; a connection
    /// that was only waiting to retry has nothing to close and goes straight
    /// to [`ConnectionState::Closed`].
    pub fn close(&mut self) -> Vec<ConnectionAction> {
        self.last_heartbeat = None;

        match self.state {
            ConnectionState::Connecting if self.retry_scheduled_at.is_some() => {
                self.retry_scheduled_at = None;
                self.state = ConnectionState::Closed;
                vec![]
            },
            ConnectionState::Open | ConnectionState::Connecting => {
                self.state = ConnectionState::Closing;
                vec![ConnectionAction::Disconnect]
            },
            ConnectionState::Uninstantiated => {
                self.state = ConnectionState::Closed;
                vec![]
            },
            ConnectionState::Closing | ConnectionState::Closed => vec![],
        }
    }

    /// Process periodic maintenance (keepalive and pending reconnects).
    ///
    /// Call this periodically; it is idempotent between deadlines.
    pub fn tick(&mut self, now: I) -> Vec<ConnectionAction> {
        match self.state {
            ConnectionState::Open => {
                let should_send = match self.last_heartbeat {
                    None => true,
                    Some(last) => now - last >= self.config.heartbeat_interval,
                };

                if should_send {
                    self.last_heartbeat = Some(now);
                    return vec![ConnectionAction::SendFrame(Command::Ping.to_frame())];
                }
                vec![]
            },
            ConnectionState::Connecting => match self.retry_scheduled_at {
                Some(scheduled) if now - scheduled >= self.config.reconnect_interval => {
                    self.retry_scheduled_at = None;
                    tracing::debug!(
                        url = %self.url,
                        attempt = self.reconnect_attempts,
                        "reconnecting"
                    );
                    vec![ConnectionAction::Connect { url: self.url.clone() }]
                },
                _ => vec![],
            },
            ConnectionState::Uninstantiated
            | ConnectionState::Closing
            | ConnectionState::Closed => vec![],
        }
    }

    /// Serialize and transmit a command.
    ///
    /// Silently dropped unless open. Callers that need delivery must gate
    /// on [`Connection::is_open`] themselves.
    pub fn send(&self, command: &Command) -> Vec<ConnectionAction> {
        if !self.is_open() {
            tracing::debug!(state = ?self.state, kind = command.kind(), "dropping send while not open");
            return vec![];
        }

        vec![ConnectionAction::SendFrame(command.to_frame())]
    }

    /// Parse one inbound frame into exactly one command.
    ///
    /// Malformed frames are logged and discarded; frames arriving while not
    /// open belong to a transport this state machine no longer trusts and
    /// are discarded too.
    pub fn receive(&self, frame: &str) -> Option<Command> {
        if !self.is_open() {
            tracing::debug!(state = ?self.state, "dropping frame while not open");
            return None;
        }

        match Command::from_frame(frame) {
            Ok(command) => Some(command),
            Err(e) => {
                tracing::warn!(error = %e, len = frame.len(), "discarding malformed frame");
                None
            },
        }
    }

    /// Time until the next timer fires. `None` if no timer is armed.
    ///
    /// Lets drivers sleep precisely instead of polling [`Connection::tick`].
    #[must_use]
    pub fn time_until_next_timer(&self, now: I) -> Option<Duration> {
        let (started, period) = match (self.state, self.last_heartbeat, self.retry_scheduled_at) {
            (ConnectionState::Open, Some(last), _) => (last, self.config.heartbeat_interval),
            (ConnectionState::Connecting, _, Some(scheduled)) => {
                (scheduled, self.config.reconnect_interval)
            },
            _ => return None,
        };

        Some(period.saturating_sub(now - started))
    }
}
