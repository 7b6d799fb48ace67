//! # Shared Types Crate
//!
//! This crate contains the domain vocabulary shared across subsystems:
//! node/link/pair identifiers, network entities, route alerts, key
//! metadata, and the session result aggregate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Projections over internals**: Subsystems publish reduced views
//!   (`KeyInfo`, `PhotonProgress`) rather than their internal state, so
//!   subscribers never observe secrets they have no business holding.

pub mod entities;

pub use entities::*;
