//! Server configuration.

/// Address the relay binds to when none is configured.
pub const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:9002";

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to listen on. Port 0 picks a free port.
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { bind_address: DEFAULT_BIND_ADDRESS.to_string() }
    }
}
