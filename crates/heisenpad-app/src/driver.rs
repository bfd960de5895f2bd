//! Driver trait for abstracting I/O operations.
//!
//! The [`Driver`] trait decouples the session runtime from specific I/O
//! implementations. Each frontend implements the trait to provide
//! platform-specific I/O, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, ops::Sub, time::Duration};

use crate::{SessionEvent, SessionRequest, SessionSnapshot};

/// One unit of work for the runtime.
///
/// The runtime processes inputs strictly one at a time, to completion, in
/// the order the driver yields them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverInput {
    /// Request from the presentation layer.
    Request(SessionRequest),
    /// Transport lifecycle event or inbound frame.
    Transport(SessionEvent),
    /// Timer tick.
    Tick,
}

/// Abstracts I/O operations for the session runtime.
///
/// Implementations provide platform-specific I/O while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in production and simulation.
///
/// # Implementations
///
/// - **Client**: tokio-tungstenite WebSocket transport, watch-channel rendering
/// - **Tests**: scripted drivers that echo frames back in process
///
/// # Associated Types
///
/// - [`Error`](Driver::Error): Platform-specific error type
/// - [`Instant`](Driver::Instant): Time representation (real or virtual)
pub trait Driver: Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Time instant type. Enables virtual time in simulation.
    type Instant: Copy + Ord + Send + Sync + Sub<Output = Duration>;

    /// Wait for the next input.
    ///
    /// Returns `None` when no further input will ever arrive; the runtime
    /// then stops.
    fn next_input(
        &mut self,
    ) -> impl Future<Output = Result<Option<DriverInput>, Self::Error>> + Send;

    /// Open a transport for `generation`.
    ///
    /// Completion is reported later as [`SessionEvent::TransportOpened`] or
    /// [`SessionEvent::TransportClosed`] carrying the same generation.
    ///
    /// # Errors
    ///
    /// Returns an error only if the driver itself is unusable. Connection
    /// failures are reported as events.
    fn connect(
        &mut self,
        generation: u64,
        url: &str,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Send a text frame over the transport of `generation`.
    ///
    /// Frames for a transport that no longer exists are dropped.
    fn send_frame(
        &mut self,
        generation: u64,
        frame: String,
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Close the transport of `generation`, reporting
    /// [`SessionEvent::TransportClosed`] once it is gone.
    fn disconnect(&mut self, generation: u64);

    /// Current time instant.
    fn now(&self) -> Self::Instant;

    /// Render the session state.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, snapshot: SessionSnapshot) -> Result<(), Self::Error>;

    /// Release resources. Called once when the runtime exits.
    fn stop(&mut self);
}
