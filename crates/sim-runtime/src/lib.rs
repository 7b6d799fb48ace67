//! # QKD-Mesh Simulation Runtime
//!
//! Composition root for the simulator. [`config`] assembles a runnable
//! configuration from `QKD_*` environment variables; [`driver`] wires the
//! protocol engine, the routing controller, and the keystore over the
//! shared event bus and runs generation rounds against them.
//!
//! The binary in `main.rs` adds logging, the scripted mid-run attack, and
//! graceful shutdown around the driver.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod driver;

pub use config::RuntimeConfig;
pub use driver::{RoundSummary, SimulationDriver};
