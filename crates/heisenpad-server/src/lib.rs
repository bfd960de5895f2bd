//! Heisenpad relay server
//!
//! Stateless fan-out for channel-scoped WebSocket connections. The relay
//! never stores a message: every accepted command is forwarded to the
//! connections currently in the same channel and then forgotten. Once the
//! last connection of a channel leaves, nothing of that channel remains.
//!
//! # Components
//!
//! - [`route`]: pure routing rule for one inbound frame
//! - [`ChannelRegistry`]: channel → connection → outbound queue
//! - [`Server`]: axum WebSocket endpoint at `/ws/{channel}`

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod error;
mod registry;
mod route;
mod server;

pub use config::{DEFAULT_BIND_ADDRESS, ServerConfig};
pub use error::ServerError;
pub use registry::{ChannelRegistry, ConnectionId};
pub use route::{Route, route};
pub use server::Server;
