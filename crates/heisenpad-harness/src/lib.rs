//! Deterministic simulation harness for Heisenpad.
//!
//! [`SimEnv`] replaces the clock and the RNG with virtual, seeded versions.
//! [`SimCluster`] runs many sessions against an in-memory relay that applies
//! the same routing rule as the real server, with a single FIFO event queue
//! so every run with the same seed and the same operations is identical.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cluster;
pub mod sim_env;

pub use cluster::{ClientStats, SimCluster};
pub use sim_env::{SimEnv, SimInstant};
