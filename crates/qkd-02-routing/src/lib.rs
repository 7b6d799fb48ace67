//! # QKD Subsystem 2: Adaptive Routing Controller
//!
//! Owns the network graph, tracks per-link error rates, computes
//! least-risk paths, and reacts to rising rates by rerouting and
//! alerting.
//!
//! ## Invariants
//!
//! - A link is compromised exactly from the moment its rate reaches the
//!   critical threshold until it drops below the warning threshold.
//! - An upward warning crossing recomputes the route and appends its
//!   alert before the updating call returns; observers never see an
//!   alert whose route is stale.
//! - All graph mutation happens under one lock per controller; reads are
//!   served from consistent snapshots.

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod controller;
pub mod domain;
pub mod error;

pub use config::{RoutingConfig, TopologySpec};
pub use controller::{
    LinkUpdateOutcome, NetworkHealth, PoisonOutcome, RouteChange, RoutingController,
    TopologySnapshot,
};
pub use domain::dijkstra::shortest_path;
pub use domain::paths::{all_simple_paths, safe_path_exists};
pub use domain::topology::NetworkTopology;
pub use error::{RoutingError, RoutingResult};
