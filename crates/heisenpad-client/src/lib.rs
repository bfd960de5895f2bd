//! Heisenpad client
//!
//! Production I/O for the session runtime: a tokio-tungstenite WebSocket
//! transport, a [`Driver`](heisenpad_app::Driver) implementation over it,
//! and a cloneable [`SessionHandle`] for presentation code.
//!
//! ```no_run
//! # async fn demo() -> Result<(), heisenpad_client::ClientError> {
//! let (handle, _task) = heisenpad_client::spawn(heisenpad_client::ClientConfig::default())?;
//! handle.set_passphrase("pw").await?;
//! handle.send_text("hello").await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
pub mod display;
mod driver;
mod env;
mod error;
mod handle;
pub mod transport;

pub use config::ClientConfig;
pub use driver::WsDriver;
pub use env::SystemEnv;
pub use error::ClientError;
pub use handle::{SessionHandle, spawn};
pub use transport::TransportError;
