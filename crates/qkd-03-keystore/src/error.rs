//! Error types for the key lifecycle manager.

use qkd_01_protocol::ProtocolError;
use shared_types::{KeyId, KeyStatus, PairId};
use thiserror::Error;

/// Errors produced by keystore operations.
///
/// Absence of a key and exhaustion of a pool are expected domain
/// conditions; callers branch on them rather than aborting.
#[derive(Debug, Error)]
pub enum KeystoreError {
    /// The configuration cannot back a manager.
    #[error("invalid keystore config: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },

    /// No entry exists under the given id.
    #[error("key {key} not found")]
    KeyNotFound {
        /// The id that was looked up.
        key: KeyId,
    },

    /// The entry exists but has already left the `Active` state.
    #[error("key {key} is {status}, not active")]
    KeyNotActive {
        /// The id that was looked up.
        key: KeyId,
        /// The status the entry was found in.
        status: KeyStatus,
    },

    /// The pair has no `Active` entry to serve.
    #[error("no active key for pair {pair}")]
    NoActiveKey {
        /// The pair that was queried.
        pair: PairId,
    },

    /// The adversary holds no stolen copy for the pair.
    #[error("no stolen key recorded for pair {pair}")]
    NoStolenKey {
        /// The pair that was queried.
        pair: PairId,
    },

    /// The stored material cannot cover the requested operation.
    #[error("key material too short: need {needed} bits, have {available}")]
    KeyTooShort {
        /// Bits the cipher required.
        needed: usize,
        /// Bits the entry actually holds.
        available: usize,
    },

    /// Malformed or unauthentic ciphertext.
    #[error("ciphertext rejected: {reason}")]
    CiphertextRejected {
        /// Why the ciphertext was refused.
        reason: String,
    },

    /// A generation run failed before producing a session result.
    #[error("protocol failure: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Convenience alias for keystore results.
pub type KeystoreResult<T> = Result<T, KeystoreError>;
