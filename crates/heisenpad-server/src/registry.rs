//! Channel registry for connection tracking.
//!
//! Maps channel → connection → outbound queue. Channels are created by
//! their first connection and disappear with their last, so the registry
//! only ever describes who is listening right now.

use std::{collections::HashMap, fmt};

use heisenpad_proto::Channel;
use tokio::sync::mpsc;

/// Server-assigned connection identifier. Unique for the server lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Registry of live connections per channel.
#[derive(Debug, Default)]
pub struct ChannelRegistry {
    /// Channel → connection → outbound frame queue
    channels: HashMap<Channel, HashMap<ConnectionId, mpsc::UnboundedSender<String>>>,
    /// Next connection id
    next_id: u64,
}

impl ChannelRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a connection to `channel`.
    ///
    /// Returns its id and the queue of frames to write to its socket.
    pub fn register(
        &mut self,
        channel: &Channel,
    ) -> (ConnectionId, mpsc::UnboundedReceiver<String>) {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;

        let (tx, rx) = mpsc::unbounded_channel();
        self.channels.entry(channel.clone()).or_default().insert(id, tx);
        (id, rx)
    }

    /// Remove a connection. Empty channels are dropped.
    ///
    /// Returns `false` if the connection was not registered.
    pub fn unregister(&mut self, channel: &Channel, id: ConnectionId) -> bool {
        let Some(connections) = self.channels.get_mut(channel) else {
            return false;
        };

        let removed = connections.remove(&id).is_some();
        if connections.is_empty() {
            self.channels.remove(channel);
        }
        removed
    }

    /// Queue `frame` for every connection in `channel`.
    ///
    /// Returns the number of connections it was queued for.
    pub fn broadcast(&self, channel: &Channel, frame: &str) -> usize {
        let Some(connections) = self.channels.get(channel) else {
            return 0;
        };

        connections.values().filter(|tx| tx.send(frame.to_string()).is_ok()).count()
    }

    /// Queue `frame` for one connection.
    ///
    /// Returns `false` if it is gone.
    pub fn send_to(&self, channel: &Channel, id: ConnectionId, frame: &str) -> bool {
        self.channels
            .get(channel)
            .and_then(|connections| connections.get(&id))
            .is_some_and(|tx| tx.send(frame.to_string()).is_ok())
    }

    /// Number of channels with at least one connection.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of connections in `channel`.
    pub fn connection_count(&self, channel: &Channel) -> usize {
        self.channels.get(channel).map_or(0, HashMap::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_reaches_only_same_channel() {
        let mut registry = ChannelRegistry::new();
        let lobby = Channel::new("lobby");
        let other = Channel::new("other");

        let (_, mut a) = registry.register(&lobby);
        let (_, mut b) = registry.register(&lobby);
        let (_, mut c) = registry.register(&other);

        assert_eq!(registry.broadcast(&lobby, "frame"), 2);
        assert_eq!(a.try_recv().unwrap(), "frame");
        assert_eq!(b.try_recv().unwrap(), "frame");
        assert!(c.try_recv().is_err());
    }

    #[test]
    fn last_connection_removes_channel() {
        let mut registry = ChannelRegistry::new();
        let lobby = Channel::new("lobby");

        let (a, _rx_a) = registry.register(&lobby);
        let (b, _rx_b) = registry.register(&lobby);
        assert_eq!(registry.connection_count(&lobby), 2);

        assert!(registry.unregister(&lobby, a));
        assert_eq!(registry.channel_count(), 1);
        assert!(registry.unregister(&lobby, b));
        assert_eq!(registry.channel_count(), 0);
        assert!(!registry.unregister(&lobby, b));
    }

    #[test]
    fn send_to_targets_one_connection() {
        let mut registry = ChannelRegistry::new();
        let lobby = Channel::new("lobby");

        let (a, mut rx_a) = registry.register(&lobby);
        let (_, mut rx_b) = registry.register(&lobby);

        assert!(registry.send_to(&lobby, a, "pong"));
        assert_eq!(rx_a.try_recv().unwrap(), "pong");
        assert!(rx_b.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_is_not_counted() {
        let mut registry = ChannelRegistry::new();
        let lobby = Channel::new("lobby");

        let (_, rx_a) = registry.register(&lobby);
        let (_, _rx_b) = registry.register(&lobby);
        drop(rx_a);

        assert_eq!(registry.broadcast(&lobby, "frame"), 1);
    }

    #[test]
    fn ids_are_unique() {
        let mut registry = ChannelRegistry::new();
        let (a, _) = registry.register(&Channel::new("x"));
        let (b, _) = registry.register(&Channel::new("y"));
        assert_ne!(a, b);
    }
}
