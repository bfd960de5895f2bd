//! In-memory relay driving many sessions.
//!
//! Every session action is executed synchronously against a simulated relay
//! that routes frames with [`heisenpad_server::route`]. Resulting events go
//! into one FIFO queue shared by all clients, so the relay imposes a single
//! total order on deliveries, just like the real server's per-connection
//! queues fed from one broadcast loop.

use std::{collections::VecDeque, time::Duration};

use heisenpad_app::{ConnectionError, Session, SessionAction, SessionConfig, SessionEvent};
use heisenpad_core::Environment;
use heisenpad_proto::{Channel, Command};
use heisenpad_server::{Route, route};

use crate::SimEnv;

/// Upper bound on deliveries in one [`SimCluster::deliver_all`] call.
const MAX_DELIVERIES: usize = 100_000;

/// Per-client transport counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// `Connect` actions executed.
    pub connects: usize,
    /// Connects refused because the relay was offline.
    pub refused: usize,
    /// Frames accepted by the relay.
    pub frames_sent: usize,
    /// Keepalive pings among `frames_sent`.
    pub pings_sent: usize,
    /// Frames sent without a live link and lost.
    pub frames_lost: usize,
    /// Frames handed to the session.
    pub frames_received: usize,
    /// `Render` actions produced.
    pub renders: usize,
}

/// Relay-side view of one open transport.
#[derive(Debug, Clone)]
struct Link {
    generation: u64,
    channel: Channel,
}

struct SimClient {
    session: Session<SimEnv>,
    link: Option<Link>,
    stats: ClientStats,
}

/// Cluster of sessions around one simulated relay.
pub struct SimCluster {
    env: SimEnv,
    clients: Vec<SimClient>,
    queue: VecDeque<(usize, SessionEvent)>,
    relay_online: bool,
}

impl SimCluster {
    /// `count` sessions in the default channel, started and settled.
    pub fn new(seed: u64, count: usize) -> Self {
        Self::with_config(seed, count, &SessionConfig::default())
    }

    /// `count` sessions sharing `config`, started and settled.
    pub fn with_config(seed: u64, count: usize, config: &SessionConfig) -> Self {
        let env = SimEnv::with_seed(seed);
        let clients = (0..count)
            .map(|_| SimClient {
                session: Session::new(env.clone(), config.clone()),
                link: None,
                stats: ClientStats::default(),
            })
            .collect();

        let mut cluster = Self { env, clients, queue: VecDeque::new(), relay_online: true };
        for client in 0..count {
            cluster.submit(client, Session::start);
        }
        cluster.deliver_all();
        cluster
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Whether the cluster has no sessions.
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Shared simulated environment.
    pub fn env(&self) -> &SimEnv {
        &self.env
    }

    /// Session of `client`.
    pub fn session(&self, client: usize) -> &Session<SimEnv> {
        &self.clients[client].session
    }

    /// Transport counters of `client`.
    pub fn stats(&self, client: usize) -> &ClientStats {
        &self.clients[client].stats
    }

    /// Whether the relay holds an open link for `client`.
    pub fn is_linked(&self, client: usize) -> bool {
        self.clients[client].link.is_some()
    }

    /// Events waiting for delivery.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Run `op` on a session and execute its actions without delivering
    /// the resulting events.
    pub fn submit<F>(&mut self, client: usize, op: F)
    where
        F: FnOnce(&mut Session<SimEnv>) -> Vec<SessionAction>,
    {
        let actions = op(&mut self.clients[client].session);
        self.execute(client, actions);
    }

    /// [`SimCluster::submit`] followed by [`SimCluster::deliver_all`].
    pub fn perform<F>(&mut self, client: usize, op: F)
    where
        F: FnOnce(&mut Session<SimEnv>) -> Vec<SessionAction>,
    {
        self.submit(client, op);
        self.deliver_all();
    }

    /// Send a text message from `client` and settle.
    pub fn send_text(&mut self, client: usize, text: &str) {
        self.perform(client, |s| s.send_text(text));
    }

    /// Change the passphrase of `client`.
    pub fn set_passphrase(&mut self, client: usize, passphrase: &str) {
        self.perform(client, |s| s.set_passphrase(passphrase));
    }

    /// Move `client` to `channel` and settle.
    pub fn join(&mut self, client: usize, channel: &str) {
        let channel = Channel::new(channel);
        self.perform(client, |s| s.join(channel));
    }

    /// Delete a message from `client` and settle.
    pub fn delete(&mut self, client: usize, id: &str) {
        self.perform(client, |s| s.delete_message(id));
    }

    /// Manual reconnect of `client`, then settle.
    ///
    /// # Errors
    ///
    /// - `ConnectionError::InvalidState` unless the connection is closed
    pub fn reconnect(&mut self, client: usize) -> Result<(), ConnectionError> {
        let actions = self.clients[client].session.reconnect()?;
        self.execute(client, actions);
        self.deliver_all();
        Ok(())
    }

    /// Bring the relay up or down.
    ///
    /// Going down drops every link. While down, connects are refused.
    pub fn set_relay_online(&mut self, online: bool) {
        self.relay_online = online;
        if !online {
            for client in 0..self.clients.len() {
                self.drop_link(client);
            }
        }
    }

    /// Server-side drop of the link of `client`, as on a network failure.
    pub fn drop_link(&mut self, client: usize) {
        if let Some(link) = self.clients[client].link.take() {
            tracing::debug!(client, generation = link.generation, "link dropped");
            self.queue.push_back((
                client,
                SessionEvent::TransportClosed { generation: link.generation, reason: "link dropped".into() },
            ));
        }
    }

    /// Deliver one queued event. Returns `false` when the queue is empty.
    pub fn step(&mut self) -> bool {
        let Some((client, event)) = self.queue.pop_front() else {
            return false;
        };

        if matches!(event, SessionEvent::FrameReceived { .. }) {
            self.clients[client].stats.frames_received += 1;
        }

        let now = self.env.now();
        let actions = self.clients[client].session.handle(event, now);
        self.execute(client, actions);
        true
    }

    /// Deliver until the queue is empty. Returns the number delivered.
    pub fn deliver_all(&mut self) -> usize {
        let mut delivered = 0;
        while delivered < MAX_DELIVERIES && self.step() {
            delivered += 1;
        }

        if delivered == MAX_DELIVERIES {
            tracing::warn!(pending = self.queue.len(), "delivery limit reached");
        }
        delivered
    }

    /// Advance the clock by `duration`, tick every session, and settle.
    pub fn advance(&mut self, duration: Duration) {
        self.env.advance(duration);
        let now = self.env.now();
        for client in 0..self.clients.len() {
            self.submit(client, |s| s.handle(SessionEvent::Tick, now));
        }
        self.deliver_all();
    }

    /// Advance in increments of `step` until `total` has elapsed.
    pub fn run_for(&mut self, total: Duration, step: Duration) {
        let mut elapsed = Duration::ZERO;
        while elapsed < total {
            let next = step.min(total - elapsed);
            self.advance(next);
            elapsed += next;
        }
    }

    fn execute(&mut self, client: usize, actions: Vec<SessionAction>) {
        for action in actions {
            match action {
                SessionAction::Connect { generation, url } => self.connect(client, generation, &url),
                SessionAction::Send { generation, frame } => self.relay(client, generation, frame),
                SessionAction::Disconnect { generation } => {
                    let state = &mut self.clients[client];
                    if state.link.as_ref().is_some_and(|l| l.generation == generation) {
                        state.link = None;
                        self.queue.push_back((
                            client,
                            SessionEvent::TransportClosed { generation, reason: "closed by client".into() },
                        ));
                    }
                },
                SessionAction::Render => self.clients[client].stats.renders += 1,
            }
        }
    }

    fn connect(&mut self, client: usize, generation: u64, url: &str) {
        let state = &mut self.clients[client];
        state.stats.connects += 1;

        if !self.relay_online {
            state.stats.refused += 1;
            self.queue.push_back((
                client,
                SessionEvent::TransportClosed { generation, reason: "connection refused".into() },
            ));
            return;
        }

        let channel = Channel::from_encoded(url.rsplit('/').next().unwrap_or_default());
        tracing::trace!(client, generation, %channel, "link opened");

        state.link = Some(Link { generation, channel });
        self.queue.push_back((client, SessionEvent::TransportOpened { generation }));
    }

    fn relay(&mut self, client: usize, generation: u64, frame: String) {
        let state = &mut self.clients[client];
        let Some(link) = state.link.as_ref().filter(|l| l.generation == generation) else {
            state.stats.frames_lost += 1;
            return;
        };

        state.stats.frames_sent += 1;
        if matches!(Command::from_frame(&frame), Ok(Command::Ping)) {
            state.stats.pings_sent += 1;
        }

        match route(&frame) {
            Route::Echo => {
                self.queue.push_back((client, SessionEvent::FrameReceived { generation, frame }));
            },
            Route::Broadcast => {
                let channel = link.channel.clone();
                for (peer, other) in self.clients.iter().enumerate() {
                    if let Some(l) = other.link.as_ref().filter(|l| l.channel == channel) {
                        self.queue.push_back((
                            peer,
                            SessionEvent::FrameReceived { generation: l.generation, frame: frame.clone() },
                        ));
                    }
                }
            },
            Route::Drop => {},
        }
    }
}

impl std::fmt::Debug for SimCluster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimCluster")
            .field("clients", &self.clients.len())
            .field("pending", &self.queue.len())
            .field("relay_online", &self.relay_online)
            .finish_non_exhaustive()
    }
}
