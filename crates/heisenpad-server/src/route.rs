//! Routing rule for inbound frames.

use heisenpad_proto::Command;

/// Where an inbound frame goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Back to the sender only.
    Echo,
    /// To every connection in the sender's channel, sender included.
    Broadcast,
    /// Nowhere.
    Drop,
}

/// Decide where one inbound frame goes.
///
/// Pings are echoed so the sender's keepalive sees traffic. Mutations are
/// broadcast to the whole channel including the sender, whose own chat
/// state only updates from that echo. Malformed frames are dropped here so
/// they never reach other clients.
pub fn route(frame: &str) -> Route {
    match Command::from_frame(frame) {
        Ok(Command::Ping) => Route::Echo,
        Ok(Command::Put { .. } | Command::Delete { .. }) => Route::Broadcast,
        Err(e) => {
            tracing::warn!(error = %e, len = frame.len(), "dropping malformed frame");
            Route::Drop
        },
    }
}
