//! One stored key and its one-way lifecycle.

use crate::domain::digest_hex;
use crate::error::{KeystoreError, KeystoreResult};
use shared_types::{now_millis, KeyId, KeyInfo, KeyStatus, PairId};

/// A stored key. Status moves `Active -> Used` or
/// `Active -> Compromised`, never back; the material itself is kept
/// for audit even after the entry leaves the active state.
#[derive(Debug, Clone)]
pub struct KeyEntry {
    /// Stable key identity.
    pub id: KeyId,
    /// The pair the key belongs to.
    pub pair: PairId,
    /// QBER measured by the producing session.
    pub qber: f64,
    /// Creation time, milliseconds since the epoch.
    pub created_at_ms: u64,
    bits: Vec<bool>,
    status: KeyStatus,
    used_at_ms: Option<u64>,
    digest_hex: String,
}

impl KeyEntry {
    /// Create a fresh `Active` entry around the given material.
    #[must_use]
    pub fn new(pair: PairId, bits: Vec<bool>, qber: f64) -> Self {
        let digest_hex = digest_hex(&bits);
        Self {
            id: KeyId::generate(),
            pair,
            qber,
            created_at_ms: now_millis(),
            bits,
            status: KeyStatus::Active,
            used_at_ms: None,
            digest_hex,
        }
    }

    /// Current lifecycle status.
    #[must_use]
    pub fn status(&self) -> KeyStatus {
        self.status
    }

    /// The raw key material.
    #[must_use]
    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    /// Key length in bits.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Whether the entry holds no material at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// When the entry was consumed, if it has been.
    #[must_use]
    pub fn used_at_ms(&self) -> Option<u64> {
        self.used_at_ms
    }

    /// Public projection carrying the digest, never the bits.
    #[must_use]
    pub fn info(&self) -> KeyInfo {
        KeyInfo {
            id: self.id.clone(),
            pair: self.pair.clone(),
            length: self.bits.len(),
            status: self.status,
            qber: self.qber,
            created_at_ms: self.created_at_ms,
            digest_hex: self.digest_hex.clone(),
        }
    }

    /// Transition `Active -> Used` and hand out the material.
    ///
    /// Fails if the entry already left the active state, which is what
    /// makes double consumption observable to the loser.
    pub(crate) fn consume(&mut self) -> KeystoreResult<Vec<bool>> {
        if !self.status.is_active() {
            return Err(KeystoreError::KeyNotActive {
                key: self.id.clone(),
                status: self.status,
            });
        }
        self.status = KeyStatus::Used;
        self.used_at_ms = Some(now_millis());
        Ok(self.bits.clone())
    }

    /// Transition `Active -> Compromised`. Returns false when the entry
    /// was not active, in which case nothing changes.
    pub(crate) fn invalidate(&mut self) -> bool {
        if !self.status.is_active() {
            return false;
        }
        self.status = KeyStatus::Compromised;
        true
    }
}
