//! Keys produced by real sessions, spent through the ciphers, and
//! pruned as the pool fills.

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use qkd_01_protocol::SessionConfig;
    use qkd_03_keystore::{AesGcmCipher, KeyManager, KeystoreConfig, XorOtp};
    use shared_types::{KeyStatus, PairId, SessionResult};

    fn manager(capacity: usize) -> KeyManager {
        KeyManager::new(KeystoreConfig {
            pool_capacity: capacity,
            ..KeystoreConfig::default()
        })
        .unwrap()
    }

    fn clean_result(bits: usize) -> SessionResult {
        SessionResult {
            requested_len: bits * 4,
            raw_count: bits * 4,
            lost_count: 0,
            sifted_sender: vec![false; bits * 2],
            sifted_receiver: vec![false; bits * 2],
            qber: 0.0,
            detected: false,
            final_key: (0..bits).map(|i| i % 3 == 0).collect(),
            qber_history: vec![0.0],
        }
    }

    #[test]
    fn test_oldest_key_spends_first_and_never_twice() {
        let keys = manager(50);
        let pair = PairId::new("A", "B");

        let (_, first) = keys
            .generate(&pair, SessionConfig::noiseless(1024), StdRng::seed_from_u64(91))
            .unwrap();
        let (_, second) = keys
            .generate(&pair, SessionConfig::noiseless(1024), StdRng::seed_from_u64(93))
            .unwrap();
        let first = first.unwrap();
        let second = second.unwrap();
        assert_eq!(keys.active_count(&pair), 2);

        let mut rng = StdRng::seed_from_u64(95);
        let (spent_a, sealed_a) = keys
            .encrypt_for(&pair, b"first dispatch", &XorOtp, &mut rng)
            .unwrap();
        let (spent_b, sealed_b) = keys
            .encrypt_for(&pair, b"second dispatch", &XorOtp, &mut rng)
            .unwrap();
        assert_eq!(spent_a, first.id);
        assert_eq!(spent_b, second.id);
        assert_eq!(keys.active_count(&pair), 0);

        // Spent keys still decrypt what they sealed.
        let opened_a = keys.decrypt_with(&spent_a, &sealed_a, &XorOtp).unwrap();
        let opened_b = keys.decrypt_with(&spent_b, &sealed_b, &XorOtp).unwrap();
        assert_eq!(opened_a, b"first dispatch");
        assert_eq!(opened_b, b"second dispatch");

        // The pool is empty; a third message has nothing to draw.
        assert!(keys
            .encrypt_for(&pair, b"third dispatch", &XorOtp, &mut rng)
            .is_err());
    }

    #[test]
    fn test_authenticated_cipher_rejects_tampering() {
        let keys = manager(50);
        let pair = PairId::new("A", "B");

        keys.generate(&pair, SessionConfig::noiseless(1024), StdRng::seed_from_u64(97))
            .unwrap();

        let mut rng = StdRng::seed_from_u64(99);
        let (spent, mut sealed) = keys
            .encrypt_for(&pair, b"hold the route", &AesGcmCipher, &mut rng)
            .unwrap();

        let opened = keys.decrypt_with(&spent, &sealed, &AesGcmCipher).unwrap();
        assert_eq!(opened, b"hold the route");

        let last = sealed.len() - 1;
        sealed[last] ^= 0x01;
        assert!(keys.decrypt_with(&spent, &sealed, &AesGcmCipher).is_err());
    }

    #[test]
    fn test_active_keys_overflow_capacity_rather_than_evict() {
        let keys = manager(2);
        let pair = PairId::new("A", "B");

        for _ in 0..4 {
            keys.store_session(&pair, &clean_result(64)).unwrap();
        }
        // Nothing is spendable yet, so nothing may be pruned.
        assert_eq!(keys.active_count(&pair), 4);

        let mut rng = StdRng::seed_from_u64(101);
        keys.encrypt_for(&pair, b"x", &XorOtp, &mut rng).unwrap();
        keys.encrypt_for(&pair, b"y", &XorOtp, &mut rng).unwrap();

        // The next store lands in a pool holding two spent entries and
        // prunes them down to capacity.
        keys.store_session(&pair, &clean_result(64)).unwrap();
        let statuses: Vec<KeyStatus> = keys
            .list_keys(&pair)
            .into_iter()
            .map(|info| info.status)
            .collect();
        assert!(keys.total_keys() <= 3);
        assert_eq!(
            statuses.iter().filter(|s| **s == KeyStatus::Active).count(),
            3
        );
    }
}
