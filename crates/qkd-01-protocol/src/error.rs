//! Error types for the protocol engine.
//!
//! Expected domain conditions (photon loss, basis mismatch, eavesdropper
//! detection, zero sifted bits) are never errors; they live in the result
//! types. Errors here reject bad input before a session starts.

use shared_types::AttackKind;
use thiserror::Error;

/// Protocol engine errors.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Configuration rejected at the boundary.
    #[error("invalid session config: {reason}")]
    InvalidConfig { reason: String },

    /// The named attack exists but has no per-qubit strategy.
    #[error("{kind} is a link-level attack, not a per-qubit strategy")]
    UnsupportedStrategy { kind: AttackKind },
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
