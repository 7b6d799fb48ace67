//! Bounded per-pair key pools.

use crate::domain::entry::KeyEntry;
use crate::error::{KeystoreError, KeystoreResult};
use shared_types::{KeyId, KeyInfo, PairId};
use std::collections::HashMap;

/// Keys bucketed by pair, oldest first within a bucket.
///
/// A bucket holds at most `capacity` entries unless every entry is
/// active; active entries are never evicted, so a bucket can exceed
/// capacity until something is used or compromised.
#[derive(Debug)]
pub struct KeyPool {
    capacity: usize,
    entries: HashMap<PairId, Vec<KeyEntry>>,
}

impl KeyPool {
    /// Create an empty pool with the given per-pair capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
        }
    }

    /// Insert an entry, then prune its bucket back toward capacity by
    /// dropping non-active entries oldest-first. Returns the pruned ids.
    pub fn insert(&mut self, entry: KeyEntry) -> Vec<KeyId> {
        let bucket = self.entries.entry(entry.pair.clone()).or_default();
        bucket.push(entry);
        let mut pruned = Vec::new();
        while bucket.len() > self.capacity {
            match bucket.iter().position(|e| !e.status().is_active()) {
                Some(i) => pruned.push(bucket.remove(i).id),
                None => break,
            }
        }
        pruned
    }

    /// Look up an entry by id.
    #[must_use]
    pub fn get(&self, id: &KeyId) -> Option<&KeyEntry> {
        self.entries.values().flatten().find(|e| e.id == *id)
    }

    fn get_mut(&mut self, id: &KeyId) -> Option<&mut KeyEntry> {
        self.entries
            .values_mut()
            .flatten()
            .find(|e| e.id == *id)
    }

    /// The oldest `Active` entry for a pair, without consuming it.
    #[must_use]
    pub fn oldest_active(&self, pair: &PairId) -> Option<&KeyEntry> {
        self.entries
            .get(pair)
            .and_then(|bucket| bucket.iter().find(|e| e.status().is_active()))
    }

    /// Atomically transition `Active -> Used` and return the material.
    pub fn consume(&mut self, id: &KeyId) -> KeystoreResult<Vec<bool>> {
        match self.get_mut(id) {
            Some(entry) => entry.consume(),
            None => Err(KeystoreError::KeyNotFound { key: id.clone() }),
        }
    }

    /// Consume the oldest `Active` entry for a pair.
    pub fn consume_oldest_active(&mut self, pair: &PairId) -> KeystoreResult<(KeyId, Vec<bool>)> {
        let id = self
            .oldest_active(pair)
            .map(|e| e.id.clone())
            .ok_or_else(|| KeystoreError::NoActiveKey { pair: pair.clone() })?;
        let bits = self.consume(&id)?;
        Ok((id, bits))
    }

    /// Transition every `Active` entry recorded strictly above the
    /// threshold to `Compromised`. Returns the affected ids.
    pub fn invalidate_over(&mut self, threshold: f64) -> Vec<KeyId> {
        let mut hit = Vec::new();
        for entry in self.entries.values_mut().flatten() {
            if entry.qber > threshold && entry.invalidate() {
                hit.push(entry.id.clone());
            }
        }
        hit
    }

    /// Number of `Active` entries for a pair.
    #[must_use]
    pub fn active_count(&self, pair: &PairId) -> usize {
        self.entries.get(pair).map_or(0, |bucket| {
            bucket.iter().filter(|e| e.status().is_active()).count()
        })
    }

    /// Public projections for a pair, oldest first.
    #[must_use]
    pub fn infos(&self, pair: &PairId) -> Vec<KeyInfo> {
        self.entries
            .get(pair)
            .map_or_else(Vec::new, |bucket| bucket.iter().map(KeyEntry::info).collect())
    }

    /// Total entries across all pairs.
    #[must_use]
    pub fn total_len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> PairId {
        PairId::new("A", "B")
    }

    fn stored(pool: &mut KeyPool, qber: f64) -> KeyId {
        let entry = KeyEntry::new(pair(), vec![true; 32], qber);
        let id = entry.id.clone();
        pool.insert(entry);
        id
    }

    #[test]
    fn test_oldest_active_is_first_inserted() {
        let mut pool = KeyPool::new(10);
        let first = stored(&mut pool, 0.01);
        stored(&mut pool, 0.02);
        stored(&mut pool, 0.03);
        assert_eq!(pool.oldest_active(&pair()).unwrap().id, first);
        assert_eq!(pool.active_count(&pair()), 3);
        // Peeking does not consume.
        assert_eq!(pool.oldest_active(&pair()).unwrap().id, first);
    }

    #[test]
    fn test_capacity_prunes_oldest_non_active_first() {
        let mut pool = KeyPool::new(3);
        let k1 = stored(&mut pool, 0.01);
        let k2 = stored(&mut pool, 0.01);
        stored(&mut pool, 0.01);
        pool.consume(&k1).unwrap();
        pool.consume(&k2).unwrap();

        let k4 = stored(&mut pool, 0.01);
        assert!(pool.get(&k1).is_none(), "oldest used entry pruned");
        assert!(pool.get(&k2).is_some(), "only one entry over capacity");
        assert!(pool.get(&k4).is_some());
        assert_eq!(pool.total_len(), 3);
    }

    #[test]
    fn test_active_entries_overflow_rather_than_evict() {
        let mut pool = KeyPool::new(2);
        for _ in 0..4 {
            stored(&mut pool, 0.01);
        }
        assert_eq!(pool.total_len(), 4);
        assert_eq!(pool.active_count(&pair()), 4);
    }

    #[test]
    fn test_consume_unknown_key() {
        let mut pool = KeyPool::new(4);
        let missing = KeyId::generate();
        assert!(matches!(
            pool.consume(&missing),
            Err(KeystoreError::KeyNotFound { .. })
        ));
        assert!(matches!(
            pool.consume_oldest_active(&pair()),
            Err(KeystoreError::NoActiveKey { .. })
        ));
    }

    #[test]
    fn test_invalidate_is_strict_and_spares_used() {
        let mut pool = KeyPool::new(10);
        let clean = stored(&mut pool, 0.05);
        let boundary = stored(&mut pool, 0.11);
        let noisy = stored(&mut pool, 0.15);
        let used_noisy = stored(&mut pool, 0.30);
        pool.consume(&used_noisy).unwrap();

        let hit = pool.invalidate_over(0.11);
        assert_eq!(hit, vec![noisy.clone()]);
        assert!(pool.get(&clean).unwrap().status().is_active());
        assert!(pool.get(&boundary).unwrap().status().is_active());
        assert_eq!(
            pool.get(&used_noisy).unwrap().status(),
            shared_types::KeyStatus::Used
        );
    }
}
