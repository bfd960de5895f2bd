//! Heisenpad core
//!
//! Pure state machines for the message-synchronization layer. Nothing in
//! this crate performs I/O or reads the clock: time is passed in, and side
//! effects come back out as actions for a driver to execute.
//!
//! # Components
//!
//! - [`Connection`]: transport lifecycle (connect, keepalive, bounded
//!   auto-reconnect, manual recovery)
//! - [`ChatState`]: ordered, deduplicated message collection fed by commands
//! - [`Environment`]: time and randomness, swapped for virtual versions in
//!   simulation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chat;
pub mod connection;
pub mod env;
pub mod error;

pub use chat::{ChatState, reduce};
pub use connection::{Connection, ConnectionAction, ConnectionConfig, ConnectionState};
pub use env::Environment;
pub use error::ConnectionError;
