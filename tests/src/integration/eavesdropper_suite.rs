//! Every attack, followed from injection to its observable consequences:
//! what the parties measure, what the monitors flag, and what the
//! adversary can actually read afterwards.

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use qkd_01_protocol::{Bb84Session, EveConfig, ProtocolError, SessionConfig};
    use qkd_02_routing::{RoutingConfig, RoutingController};
    use qkd_03_keystore::{KeyManager, KeystoreConfig, XorOtp};
    use shared_types::{AttackKind, PairId};

    #[test]
    fn test_intercept_resend_error_rate_converges_to_a_quarter() {
        let config = SessionConfig::noiseless(4096).with_eve(EveConfig::intercept_resend(1.0));
        let result = Bb84Session::new(config, StdRng::seed_from_u64(61))
            .unwrap()
            .prepare()
            .run_to_completion()
            .into_result();

        assert!(result.qber > 0.20 && result.qber < 0.30);
        assert!(result.detected);
    }

    #[test]
    fn test_stealthy_strategies_add_no_measurable_errors() {
        for (eve, seed) in [
            (EveConfig::photon_number_splitting(), 67_u64),
            (EveConfig::trojan_horse(), 71),
        ] {
            let config = SessionConfig::noiseless(2048).with_eve(eve);
            let result = Bb84Session::new(config, StdRng::seed_from_u64(seed))
                .unwrap()
                .prepare()
                .run_to_completion()
                .into_result();

            assert_eq!(result.qber, 0.0);
            assert!(!result.detected);
            assert!(result.has_usable_key());
        }
    }

    #[test]
    fn test_photon_splitting_yields_a_usable_stolen_copy() {
        let keys = KeyManager::new(KeystoreConfig::default()).unwrap();
        let pair = PairId::new("A", "B");

        // Blocking single photons costs most of the throughput, so a
        // long exchange is needed to amplify a pad worth stealing.
        let config =
            SessionConfig::noiseless(8192).with_eve(EveConfig::photon_number_splitting());
        let (result, stored) = keys
            .generate(&pair, config, StdRng::seed_from_u64(73))
            .unwrap();
        assert!(!result.detected);
        let stored = stored.unwrap();

        keys.record_stolen(&stored.id, AttackKind::PhotonNumberSplitting)
            .unwrap();
        assert!(keys.eve_can_decrypt(&pair));

        let mut rng = StdRng::seed_from_u64(74);
        let (used, ciphertext) = keys
            .encrypt_for(&pair, b"reroute at once", &XorOtp, &mut rng)
            .unwrap();
        assert_eq!(used, stored.id);

        let eavesdropped = keys.decrypt_with_stolen(&pair, &ciphertext, &XorOtp).unwrap();
        assert_eq!(eavesdropped, b"reroute at once");
    }

    #[test]
    fn test_trojan_probe_records_learned_bases_without_errors() {
        let config = SessionConfig::noiseless(2048).with_eve(EveConfig::trojan_horse());
        let completed = Bb84Session::new(config, StdRng::seed_from_u64(79))
            .unwrap()
            .prepare()
            .run_to_completion();

        let log = completed.intercept_log();
        assert!(!log.is_empty());
        assert!(log.len() <= 500);
        assert!(log
            .iter()
            .all(|record| record.kind == AttackKind::TrojanHorse));
        assert!(log.iter().any(|record| record.basis_used.is_some()));
        assert_eq!(completed.result().qber, 0.0);
    }

    #[test]
    fn test_noise_injection_lives_on_links_not_photons() {
        let mut eve = EveConfig::intercept_resend(1.0);
        eve.strategy = AttackKind::NoiseInjection;
        let config = SessionConfig::noiseless(64).with_eve(eve);

        let err = Bb84Session::new(config, StdRng::seed_from_u64(83)).err();
        assert!(matches!(
            err,
            Some(ProtocolError::UnsupportedStrategy {
                kind: AttackKind::NoiseInjection
            })
        ));

        // The routing layer is where this attack is expressible.
        let router = RoutingController::with_default_mesh(
            RoutingConfig::default(),
            StdRng::seed_from_u64(89),
        )
        .unwrap();
        let route = router.current_route().unwrap();
        let first = shared_types::LinkId::new(route[0].clone(), route[1].clone());
        let update = router
            .inject_attack(&first, AttackKind::NoiseInjection)
            .unwrap();
        assert!(update.rate_after > update.rate_before);
    }
}
