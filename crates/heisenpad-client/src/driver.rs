//! Tokio driver for the session runtime.

use std::collections::HashMap;

use heisenpad_app::{Driver, DriverInput, SessionEvent, SessionRequest, SessionSnapshot};
use heisenpad_core::Environment;
use tokio::{
    sync::{mpsc, watch},
    time::{Interval, MissedTickBehavior},
};

use crate::{ClientConfig, ClientError, SystemEnv, transport};

/// Driver backed by WebSocket transports and tokio channels.
///
/// Inputs come from three sources, multiplexed in this priority: transport
/// events, presentation requests, timer ticks. Each source keeps its own
/// order. Rendering publishes the latest snapshot on a watch channel.
pub struct WsDriver {
    env: SystemEnv,
    requests: mpsc::Receiver<SessionRequest>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
    /// Live transports by generation
    transports: HashMap<u64, transport::TransportHandle>,
    ticker: Interval,
    snapshots: watch::Sender<Option<SessionSnapshot>>,
}

impl WsDriver {
    /// Create a driver reading requests from `requests` and publishing
    /// snapshots to `snapshots`.
    pub fn new(
        config: &ClientConfig,
        requests: mpsc::Receiver<SessionRequest>,
        snapshots: watch::Sender<Option<SessionSnapshot>>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut ticker = tokio::time::interval(config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            env: SystemEnv,
            requests,
            events_tx,
            events_rx,
            transports: HashMap::new(),
            ticker,
            snapshots,
        }
    }
}

impl Driver for WsDriver {
    type Error = ClientError;
    type Instant = std::time::Instant;

    async fn next_input(&mut self) -> Result<Option<DriverInput>, ClientError> {
        tokio::select! {
            biased;

            Some(event) = self.events_rx.recv() => {
                if let SessionEvent::TransportClosed { generation, .. } = &event {
                    self.transports.remove(generation);
                }
                Ok(Some(DriverInput::Transport(event)))
            },
            request = self.requests.recv() => {
                // Every handle dropped: nobody can ever ask for anything again
                Ok(Some(DriverInput::Request(request.unwrap_or(SessionRequest::Shutdown))))
            },
            _ = self.ticker.tick() => Ok(Some(DriverInput::Tick)),
        }
    }

    async fn connect(&mut self, generation: u64, url: &str) -> Result<(), ClientError> {
        let handle = transport::connect(generation, url.to_string(), self.events_tx.clone());
        self.transports.insert(generation, handle);
        Ok(())
    }

    async fn send_frame(&mut self, generation: u64, frame: String) -> Result<(), ClientError> {
        match self.transports.get(&generation) {
            Some(transport) if transport.send(frame) => {},
            _ => tracing::debug!(generation, "dropping frame for a closed transport"),
        }
        Ok(())
    }

    fn disconnect(&mut self, generation: u64) {
        // Dropping the handle closes the socket; the task reports the close
        self.transports.remove(&generation);
    }

    fn now(&self) -> Self::Instant {
        self.env.now()
    }

    fn render(&mut self, snapshot: SessionSnapshot) -> Result<(), ClientError> {
        self.snapshots.send_replace(Some(snapshot));
        Ok(())
    }

    fn stop(&mut self) {
        self.transports.clear();
    }
}
