//! # QKD Subsystem 3: Key Lifecycle Manager
//!
//! Stores protocol output as addressable key material per communicating
//! pair, enforces single use and compromise invalidation, and exposes
//! encryption over the stored material.
//!
//! ## Invariants
//!
//! - Status transitions are one-directional: `Active -> Used` or
//!   `Active -> Compromised`. A key is never resurrected.
//! - Consumption is exactly-once: of any number of concurrent callers,
//!   one receives the material.
//! - Pools are bounded per pair; pruning drops non-active entries
//!   oldest-first and never evicts an active key.
//!
//! ## Modules
//!
//! - [`domain::entry`]: one stored key and its lifecycle
//! - [`domain::pool`]: bounded per-pair buckets
//! - [`cipher`]: swappable encryption over raw key bits
//! - [`eve`]: adversary-held key copies
//! - [`manager`]: the synchronized facade

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod cipher;
pub mod config;
pub mod domain;
pub mod error;
pub mod eve;
pub mod manager;

pub use cipher::{AesGcmCipher, KeyCipher, XorOtp};
pub use config::{KeystoreConfig, DEFAULT_INVALIDATION_THRESHOLD, DEFAULT_POOL_CAPACITY};
pub use domain::entry::KeyEntry;
pub use domain::pool::KeyPool;
pub use domain::{bits_to_bytes, bytes_to_bits, digest_hex};
pub use error::{KeystoreError, KeystoreResult};
pub use eve::{StolenKey, StolenKeyRegistry};
pub use manager::KeyManager;
