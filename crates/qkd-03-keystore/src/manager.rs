//! # Key Manager
//!
//! The single synchronized owner of stored key material. Every pool
//! mutation and every adversary-registry access goes through one lock,
//! which is what makes consumption exactly-once under concurrency.

use crate::cipher::KeyCipher;
use crate::config::KeystoreConfig;
use crate::domain::entry::KeyEntry;
use crate::domain::pool::KeyPool;
use crate::error::{KeystoreError, KeystoreResult};
use crate::eve::StolenKeyRegistry;
use parking_lot::Mutex;
use qkd_01_protocol::{Bb84Session, SessionConfig};
use rand::rngs::StdRng;
use shared_types::{AttackKind, KeyId, KeyInfo, KeyStatus, PairId, RouteAlert, SessionResult};
use tracing::{debug, info, warn};

struct ManagerInner {
    pool: KeyPool,
    stolen: StolenKeyRegistry,
}

/// Thread-safe key lifecycle manager.
pub struct KeyManager {
    config: KeystoreConfig,
    inner: Mutex<ManagerInner>,
}

impl KeyManager {
    /// Build a manager after validating the configuration.
    pub fn new(config: KeystoreConfig) -> KeystoreResult<Self> {
        config.validate()?;
        let pool = KeyPool::new(config.pool_capacity);
        Ok(Self {
            config,
            inner: Mutex::new(ManagerInner {
                pool,
                stolen: StolenKeyRegistry::default(),
            }),
        })
    }

    /// Run one full protocol session for the pair and store the result.
    ///
    /// The session summary always comes back; the key projection is
    /// `None` when an eavesdropper was detected or nothing sifted.
    pub fn generate(
        &self,
        pair: &PairId,
        session: SessionConfig,
        rng: StdRng,
    ) -> KeystoreResult<(SessionResult, Option<KeyInfo>)> {
        let completed = Bb84Session::new(session, rng)?.prepare().run_to_completion();
        let result = completed.into_result();
        let info = self.store_session(pair, &result);
        Ok((result, info))
    }

    /// Adopt the outcome of an externally driven session.
    ///
    /// Stores an `Active` entry only when the session detected no
    /// eavesdropper and amplified a non-empty key.
    pub fn store_session(&self, pair: &PairId, result: &SessionResult) -> Option<KeyInfo> {
        if !result.has_usable_key() {
            debug!(
                pair = %pair,
                detected = result.detected,
                qber = result.qber,
                "session produced no storable key"
            );
            return None;
        }
        let entry = KeyEntry::new(pair.clone(), result.final_key.clone(), result.qber);
        let info = entry.info();
        let pruned = self.inner.lock().pool.insert(entry);
        info!(
            key = %info.id,
            pair = %pair,
            bits = info.length,
            qber = info.qber,
            "key stored"
        );
        if !pruned.is_empty() {
            debug!(pair = %pair, pruned = pruned.len(), "spent entries pruned over capacity");
        }
        Some(info)
    }

    /// The oldest `Active` entry for a pair, without consuming it.
    #[must_use]
    pub fn get_active(&self, pair: &PairId) -> Option<KeyInfo> {
        self.inner.lock().pool.oldest_active(pair).map(KeyEntry::info)
    }

    /// Atomically transition a key `Active -> Used` and return its bits.
    ///
    /// Of two concurrent callers, exactly one receives the material;
    /// the other observes the `Used` status.
    pub fn consume(&self, key: &KeyId) -> KeystoreResult<Vec<bool>> {
        let bits = self.inner.lock().pool.consume(key)?;
        info!(key = %key, "key consumed");
        Ok(bits)
    }

    /// Invalidate every `Active` key recorded strictly above the
    /// threshold. Returns the affected ids.
    pub fn invalidate_compromised(&self, threshold: f64) -> Vec<KeyId> {
        let hit = self.inner.lock().pool.invalidate_over(threshold);
        if !hit.is_empty() {
            warn!(count = hit.len(), threshold, "keys invalidated as compromised");
        }
        hit
    }

    /// React to a routing alert by invalidating at the configured
    /// threshold.
    pub fn handle_alert(&self, alert: &RouteAlert) -> Vec<KeyId> {
        debug!(link = %alert.link, rate = alert.rate_after, "routing alert received");
        self.invalidate_compromised(self.config.invalidation_threshold)
    }

    /// True when the pair holds no `Active` entry and should rekey.
    #[must_use]
    pub fn needs_refresh(&self, pair: &PairId) -> bool {
        self.inner.lock().pool.oldest_active(pair).is_none()
    }

    /// Number of `Active` entries for a pair.
    #[must_use]
    pub fn active_count(&self, pair: &PairId) -> usize {
        self.inner.lock().pool.active_count(pair)
    }

    /// Public projections of every entry for a pair, oldest first.
    #[must_use]
    pub fn list_keys(&self, pair: &PairId) -> Vec<KeyInfo> {
        self.inner.lock().pool.infos(pair)
    }

    /// Total entries across all pairs, any status.
    #[must_use]
    pub fn total_keys(&self) -> usize {
        self.inner.lock().pool.total_len()
    }

    /// Consume the pair's oldest active key and encrypt under it.
    ///
    /// The key is burned even if the cipher then rejects the payload;
    /// material handed to a cipher is never re-offered.
    pub fn encrypt_for(
        &self,
        pair: &PairId,
        plaintext: &[u8],
        cipher: &dyn KeyCipher,
        rng: &mut StdRng,
    ) -> KeystoreResult<(KeyId, Vec<u8>)> {
        let (id, bits) = self.inner.lock().pool.consume_oldest_active(pair)?;
        match cipher.encrypt(&bits, plaintext, rng) {
            Ok(ciphertext) => {
                info!(
                    key = %id,
                    cipher = cipher.name(),
                    bytes = ciphertext.len(),
                    "message encrypted"
                );
                Ok((id, ciphertext))
            }
            Err(err) => {
                warn!(key = %id, cipher = cipher.name(), "key burned by failed encryption");
                Err(err)
            }
        }
    }

    /// Decrypt with a named key. `Used` entries still decrypt;
    /// `Compromised` entries are refused.
    pub fn decrypt_with(
        &self,
        key: &KeyId,
        ciphertext: &[u8],
        cipher: &dyn KeyCipher,
    ) -> KeystoreResult<Vec<u8>> {
        let bits = {
            let guard = self.inner.lock();
            let entry = guard
                .pool
                .get(key)
                .ok_or_else(|| KeystoreError::KeyNotFound { key: key.clone() })?;
            if entry.status() == KeyStatus::Compromised {
                return Err(KeystoreError::KeyNotActive {
                    key: key.clone(),
                    status: entry.status(),
                });
            }
            entry.bits().to_vec()
        };
        cipher.decrypt(&bits, ciphertext)
    }

    /// Register an adversary-held copy of a stored key.
    pub fn record_stolen(&self, key: &KeyId, kind: AttackKind) -> KeystoreResult<KeyInfo> {
        let mut guard = self.inner.lock();
        let (pair, bits, info) = {
            let entry = guard
                .pool
                .get(key)
                .ok_or_else(|| KeystoreError::KeyNotFound { key: key.clone() })?;
            (entry.pair.clone(), entry.bits().to_vec(), entry.info())
        };
        guard.stolen.record(pair, key.clone(), bits, kind);
        warn!(key = %key, attack = %kind, "key material captured by adversary");
        Ok(info)
    }

    /// Whether the adversary holds a copy usable against the pair.
    #[must_use]
    pub fn eve_can_decrypt(&self, pair: &PairId) -> bool {
        self.inner.lock().stolen.can_decrypt(pair)
    }

    /// Attempt decryption using captured copies, newest first.
    pub fn decrypt_with_stolen(
        &self,
        pair: &PairId,
        ciphertext: &[u8],
        cipher: &dyn KeyCipher,
    ) -> KeystoreResult<Vec<u8>> {
        self.inner.lock().stolen.try_decrypt(pair, ciphertext, cipher)
    }

    /// Drop every stored key and every captured copy.
    pub fn clear(&self) {
        let mut guard = self.inner.lock();
        guard.pool.clear();
        guard.stolen.clear();
        info!("keystore cleared");
    }
}
