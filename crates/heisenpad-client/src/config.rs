//! Client configuration.

use std::time::Duration;

use heisenpad_app::{DEFAULT_SERVER_URL, SessionConfig};
use heisenpad_core::ConnectionConfig;
use heisenpad_proto::Channel;

use crate::ClientError;

/// Client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay base address (`ws://` or `wss://`), without the channel path.
    pub server_url: String,
    /// Channel joined on start.
    pub channel: Channel,
    /// Passphrase applied before the first message. Empty for none.
    pub passphrase: String,
    /// Keepalive and reconnect timing.
    pub connection: ConnectionConfig,
    /// How often the runtime ticks the connection timers.
    pub tick_interval: Duration,
    /// Capacity of the request queue from presentation code.
    pub request_buffer: usize,
}

impl ClientConfig {
    /// Check the configuration before spawning.
    ///
    /// # Errors
    ///
    /// - `ClientError::InvalidServerUrl` unless the URL is `ws://` or `wss://`
    pub fn validate(&self) -> Result<(), ClientError> {
        if self.server_url.starts_with("ws://") || self.server_url.starts_with("wss://") {
            Ok(())
        } else {
            Err(ClientError::InvalidServerUrl { url: self.server_url.clone() })
        }
    }

    /// Session part of the configuration.
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            server_url: self.server_url.clone(),
            channel: self.channel.clone(),
            connection: self.connection.clone(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            channel: Channel::default(),
            passphrase: String::new(),
            connection: ConnectionConfig::default(),
            tick_interval: Duration::from_millis(100),
            request_buffer: 64,
        }
    }
}
