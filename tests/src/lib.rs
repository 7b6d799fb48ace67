//! # QKD-Mesh Test Suite
//!
//! Unified test crate exercising cross-subsystem flows the per-crate
//! suites cannot reach: measured error rates driving routing decisions,
//! routing alerts driving key invalidation, and the adversary's view of
//! the whole exchange.
//!
//! ## Structure
//!
//! ```text
//! tests/src/integration/
//! ├── session_scenarios.rs   # End-to-end protocol sessions and the driver loop
//! ├── detection_flow.rs      # Measured QBER -> reroute -> invalidation -> refresh
//! ├── eavesdropper_suite.rs  # All four attacks, from injection to decryption
//! └── key_lifecycle.rs       # Keys produced, spent, and pruned across sessions
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qkd-tests
//! cargo test -p qkd-tests integration::detection_flow
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod integration;
