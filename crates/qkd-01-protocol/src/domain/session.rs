//! # Photon Records and Privacy Amplification
//!
//! The per-step audit trail a session accumulates, and the hash-based
//! compression applied to the sifted key after a clean session.

use crate::config::MAX_FINAL_KEY_BITS;
use crate::domain::qubit::Basis;
use sha2::{Digest, Sha256};
use shared_types::PhotonProgress;

/// Immutable audit row for one protocol step.
///
/// Only `is_error` is set after creation, during summarization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotonRecord {
    /// Zero-based photon index within the session.
    pub index: usize,
    /// The bit the sender encoded.
    pub sender_bit: bool,
    /// The basis the sender prepared in.
    pub sender_basis: Basis,
    /// The bit an eavesdropper obtained, if any.
    pub eve_bit: Option<bool>,
    /// The basis an eavesdropper used or learned, if any.
    pub eve_basis: Option<Basis>,
    /// Whether the photon was lost (blocked or dropped in the channel).
    pub lost: bool,
    /// The basis the receiver chose before transmission.
    pub receiver_basis: Basis,
    /// The receiver's measurement, absent when the photon never arrived.
    pub receiver_bit: Option<bool>,
    /// Whether sender and receiver chose the same basis.
    pub bases_matched: bool,
    /// Whether this sifted position disagreed between the parties.
    pub is_error: bool,
}

impl PhotonRecord {
    /// Whether this record contributes to the sifted key.
    #[must_use]
    pub fn sifted(&self) -> bool {
        !self.lost && self.bases_matched && self.receiver_bit.is_some()
    }

    /// The reduced view published while a session steps.
    #[must_use]
    pub fn progress(&self) -> PhotonProgress {
        PhotonProgress {
            index: self.index,
            delivered: !self.lost,
            bases_matched: self.bases_matched,
        }
    }
}

/// Compress a sifted key into the final key.
///
/// Hashes the bit string with SHA-256 and truncates to
/// `min(sifted_len / 2, MAX_FINAL_KEY_BITS)` bits, removing any partial
/// information a bounded eavesdropper may hold at the cost of length.
/// An empty sifted key yields an empty final key.
#[must_use]
pub fn privacy_amplify(sifted: &[bool]) -> Vec<bool> {
    let target = (sifted.len() / 2).min(MAX_FINAL_KEY_BITS);
    if target == 0 {
        return Vec::new();
    }

    let ascii: String = sifted.iter().map(|&b| if b { '1' } else { '0' }).collect();
    let digest = Sha256::digest(ascii.as_bytes());

    digest
        .iter()
        .flat_map(|byte| (0..8).rev().map(move |shift| (byte >> shift) & 1 == 1))
        .take(target)
        .collect()
}
