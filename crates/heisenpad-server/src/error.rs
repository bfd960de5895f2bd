//! Server error types.

use thiserror::Error;

/// Errors that can occur while running the relay.
///
/// Per-connection failures are not errors at this level: a broken socket
/// only removes that connection from its channel.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Listener could not be bound.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Requested bind address
        address: String,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Listener or serve loop failed.
    #[error("server I/O error: {0}")]
    Io(#[from] std::io::Error),
}
