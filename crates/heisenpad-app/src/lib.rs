//! Application layer for Heisenpad
//!
//! The session coordinator and a generic runtime that drives it, so the same
//! orchestration code runs against real sockets and in simulation.
//!
//! # Components
//!
//! - [`Session`]: per-channel coordinator (join, passphrase, send, delete,
//!   resend, decrypted view)
//! - [`Driver`]: trait for platform-specific I/O
//! - [`Runtime`]: generic event loop feeding one input at a time to the
//!   session and executing its actions through the driver

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod action;
mod config;
mod driver;
mod event;
mod request;
mod runtime;
mod session;
mod view;

pub use action::SessionAction;
pub use config::{DEFAULT_SERVER_URL, SessionConfig};
pub use driver::{Driver, DriverInput};
pub use event::SessionEvent;
pub use heisenpad_core::{ConnectionConfig, ConnectionError, ConnectionState};
pub use request::SessionRequest;
pub use runtime::Runtime;
pub use session::Session;
pub use view::{MessageBody, MessageView, SessionSnapshot};
