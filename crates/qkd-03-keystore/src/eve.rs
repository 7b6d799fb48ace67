//! Adversary-side capture bookkeeping.
//!
//! Models the endgame of a stealthy capture: once an attack has yielded
//! full knowledge of a generated key, the adversary holds a copy and
//! can attempt decryption of traffic between the victim pair.

use crate::cipher::KeyCipher;
use crate::error::{KeystoreError, KeystoreResult};
use shared_types::{now_millis, AttackKind, KeyId, PairId};
use std::collections::HashMap;

/// One captured key copy.
#[derive(Debug, Clone)]
pub struct StolenKey {
    /// The stored key this copies.
    pub key: KeyId,
    /// The captured material.
    pub bits: Vec<bool>,
    /// The attack that yielded the copy.
    pub kind: AttackKind,
    /// Capture time, milliseconds since the epoch.
    pub stolen_at_ms: u64,
}

/// Captured copies bucketed by victim pair, oldest first.
#[derive(Debug, Default)]
pub struct StolenKeyRegistry {
    captures: HashMap<PairId, Vec<StolenKey>>,
}

impl StolenKeyRegistry {
    /// Record a captured copy of a key.
    pub fn record(&mut self, pair: PairId, key: KeyId, bits: Vec<bool>, kind: AttackKind) {
        self.captures.entry(pair).or_default().push(StolenKey {
            key,
            bits,
            kind,
            stolen_at_ms: now_millis(),
        });
    }

    /// Whether the adversary holds at least one copy for the pair.
    #[must_use]
    pub fn can_decrypt(&self, pair: &PairId) -> bool {
        self.captures.get(pair).is_some_and(|b| !b.is_empty())
    }

    /// Captured copies for a pair, oldest first.
    #[must_use]
    pub fn captures(&self, pair: &PairId) -> &[StolenKey] {
        self.captures.get(pair).map_or(&[], Vec::as_slice)
    }

    /// Attempt decryption with every captured copy, newest first.
    ///
    /// With an authenticating cipher the wrong copies fail and the
    /// matching one wins; with the pad the newest copy is simply used.
    pub fn try_decrypt(
        &self,
        pair: &PairId,
        ciphertext: &[u8],
        cipher: &dyn KeyCipher,
    ) -> KeystoreResult<Vec<u8>> {
        let bucket = self
            .captures
            .get(pair)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| KeystoreError::NoStolenKey { pair: pair.clone() })?;
        let mut last_err = None;
        for capture in bucket.iter().rev() {
            match cipher.decrypt(&capture.bits, ciphertext) {
                Ok(plaintext) => return Ok(plaintext),
                Err(err) => last_err = Some(err),
            }
        }
        Err(last_err.unwrap_or_else(|| KeystoreError::NoStolenKey { pair: pair.clone() }))
    }

    /// Forget every capture.
    pub fn clear(&mut self) {
        self.captures.clear();
    }
}
