//! Session configuration.

use heisenpad_core::ConnectionConfig;
use heisenpad_proto::Channel;

/// Relay address used when none is configured.
pub const DEFAULT_SERVER_URL: &str = "ws://127.0.0.1:9002";

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Relay base address, without the channel path.
    pub server_url: String,
    /// Channel joined on start.
    pub channel: Channel,
    /// Keepalive and reconnect timing.
    pub connection: ConnectionConfig,
}

impl SessionConfig {
    /// Transport address for `channel`: `{server_url}/ws/{encoded channel}`.
    pub fn transport_url(&self, channel: &Channel) -> String {
        format!("{}/ws/{}", self.server_url.trim_end_matches('/'), channel.as_encoded())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            channel: Channel::default(),
            connection: ConnectionConfig::default(),
        }
    }
}
