//! Session input events.
//!
//! Transport lifecycle notifications and timer ticks that drive the
//! [`crate::Session`] state machine.

/// Events processed by the Session state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Transport finished opening.
    TransportOpened {
        /// Generation of the reporting transport.
        generation: u64,
    },

    /// Transport closed, or failed to open.
    TransportClosed {
        /// Generation of the reporting transport.
        generation: u64,
        /// Human-readable cause, for logging.
        reason: String,
    },

    /// One text frame arrived.
    FrameReceived {
        /// Generation of the reporting transport.
        generation: u64,
        /// Raw frame payload.
        frame: String,
    },

    /// Periodic tick for keepalive and reconnect timers.
    Tick,
}

impl SessionEvent {
    /// Generation this event belongs to. `None` for ticks.
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::TransportOpened { generation }
            | Self::TransportClosed { generation, .. }
            | Self::FrameReceived { generation, .. } => Some(*generation),
            Self::Tick => None,
        }
    }
}
