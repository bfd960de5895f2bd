//! Protocol error types.

use thiserror::Error;

/// Result alias for protocol operations.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while decoding inbound frames.
///
/// A malformed frame is fatal to that single frame only. Callers drop the
/// frame and keep their prior state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Frame is not valid JSON or does not match any command shape.
    #[error("malformed frame: {reason}")]
    Json {
        /// Decoder diagnostic.
        reason: String,
    },

    /// A required identifier was present but empty.
    #[error("empty field: {field}")]
    EmptyField {
        /// Name of the offending field.
        field: &'static str,
    },
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json { reason: err.to_string() }
    }
}
