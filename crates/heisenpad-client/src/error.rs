//! Client error types.

use thiserror::Error;

/// Errors surfaced to presentation code.
///
/// Transport failures are not here: they drive the reconnect policy and
/// show up as connection state in snapshots.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The session runtime has stopped.
    #[error("session is no longer running")]
    SessionClosed,

    /// Server URL is not a WebSocket address.
    #[error("invalid server url {url:?}: expected ws:// or wss://")]
    InvalidServerUrl {
        /// Rejected URL
        url: String,
    },
}
