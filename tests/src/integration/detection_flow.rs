//! The grand loop: a protocol measurement lands on the routing graph,
//! the graph reacts, and the keystore reacts to the graph.

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use qkd_01_protocol::{Bb84Session, EveConfig, SessionConfig};
    use qkd_02_routing::{RoutingConfig, RoutingController};
    use qkd_03_keystore::{KeyManager, KeystoreConfig};
    use shared_types::{AttackKind, LinkId, PairId, SessionResult};

    fn controller(seed: u64) -> RoutingController {
        RoutingController::with_default_mesh(RoutingConfig::default(), StdRng::seed_from_u64(seed))
            .unwrap()
    }

    fn hop_ids(path: &[shared_types::NodeId]) -> Vec<LinkId> {
        path.windows(2)
            .map(|w| LinkId::new(w[0].clone(), w[1].clone()))
            .collect()
    }

    /// A stored key whose session measured the given error rate.
    fn noisy_result(qber: f64) -> SessionResult {
        SessionResult {
            requested_len: 512,
            raw_count: 512,
            lost_count: 20,
            sifted_sender: vec![true; 240],
            sifted_receiver: vec![true; 240],
            qber,
            detected: false,
            final_key: vec![true, false, true, false, true, false, true, false],
            qber_history: vec![qber],
        }
    }

    #[test]
    fn test_eavesdropped_measurement_reroutes_around_the_path() {
        let router = controller(41);
        let route = router.current_route().unwrap();

        let config = SessionConfig::noiseless(2000).with_eve(EveConfig::intercept_resend(1.0));
        let observed = Bb84Session::new(config, StdRng::seed_from_u64(43))
            .unwrap()
            .prepare()
            .run_to_completion()
            .into_result();
        assert!(observed.detected);

        let updates: Vec<(LinkId, f64)> = hop_ids(&route)
            .into_iter()
            .map(|link| (link, observed.qber))
            .collect();
        let outcome = router
            .poison_links(&updates, Some(AttackKind::InterceptResend))
            .unwrap();

        let alerts: Vec<_> = outcome
            .updates
            .iter()
            .filter_map(|u| u.alert.clone())
            .collect();
        assert!(!alerts.is_empty());
        let change = outcome.route_change.unwrap();
        assert!(!change.path.is_empty());

        // The new route shares no link with the poisoned path.
        let poisoned: Vec<LinkId> = updates.into_iter().map(|(link, _)| link).collect();
        for hop in hop_ids(&change.path) {
            assert!(!poisoned.contains(&hop));
        }
    }

    #[test]
    fn test_alert_invalidates_suspect_keys_then_refresh_restocks() {
        let router = controller(47);
        let keys = KeyManager::new(KeystoreConfig {
            invalidation_threshold: 0.05,
            ..KeystoreConfig::default()
        })
        .unwrap();
        let pair = PairId::new("A", "B");

        // A key that sifted through a noisy exchange: acceptable at the
        // time, suspect once an alert names its path.
        let stored = keys.store_session(&pair, &noisy_result(0.08)).unwrap();
        assert_eq!(keys.active_count(&pair), 1);

        let route = router.current_route().unwrap();
        let updates: Vec<(LinkId, f64)> = hop_ids(&route)
            .into_iter()
            .map(|link| (link, 0.27))
            .collect();
        let outcome = router
            .poison_links(&updates, Some(AttackKind::InterceptResend))
            .unwrap();

        let mut invalidated = Vec::new();
        for update in &outcome.updates {
            if let Some(alert) = &update.alert {
                invalidated.extend(keys.handle_alert(alert));
            }
        }
        assert_eq!(invalidated, vec![stored.id]);
        assert!(keys.needs_refresh(&pair));

        // Rekey over whatever the controller now prefers.
        let (result, refreshed) = keys
            .generate(&pair, SessionConfig::noiseless(1024), StdRng::seed_from_u64(49))
            .unwrap();
        assert!(!result.detected);
        assert!(refreshed.is_some());
        assert!(!keys.needs_refresh(&pair));
    }

    #[test]
    fn test_clean_measurements_leave_keys_and_routes_alone() {
        let router = controller(53);
        let keys = KeyManager::new(KeystoreConfig::default()).unwrap();
        let pair = PairId::new("A", "B");

        let (result, stored) = keys
            .generate(&pair, SessionConfig::noiseless(1024), StdRng::seed_from_u64(59))
            .unwrap();
        assert!(stored.is_some());

        let route = router.current_route().unwrap();
        let updates: Vec<(LinkId, f64)> = hop_ids(&route)
            .into_iter()
            .map(|link| (link, result.qber))
            .collect();
        let outcome = router.poison_links(&updates, None).unwrap();

        assert!(outcome.route_change.is_none());
        assert!(outcome.updates.iter().all(|u| u.alert.is_none()));
        assert_eq!(keys.active_count(&pair), 1);
        assert_eq!(router.current_route().unwrap(), route);
    }
}
