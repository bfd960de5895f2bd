//! Session side-effects.
//!
//! This module defines [`SessionAction`], the instructions produced by the
//! [`crate::Session`] state machine for the runtime to execute.

/// Actions produced by the Session state machine.
///
/// Every transport action carries the connection generation it belongs to.
/// Drivers tag the transport they open with it and report it back on every
/// [`crate::SessionEvent`], so a torn-down connection can never affect its
/// successor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Open a transport.
    Connect {
        /// Connection generation.
        generation: u64,
        /// Channel-scoped transport address.
        url: String,
    },

    /// Send one text frame over the transport of this generation.
    Send {
        /// Connection generation.
        generation: u64,
        /// JSON-encoded command.
        frame: String,
    },

    /// Close the transport of this generation.
    Disconnect {
        /// Connection generation.
        generation: u64,
    },

    /// Presentation state changed.
    Render,
}
