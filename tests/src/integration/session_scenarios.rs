//! End-to-end protocol sessions, from a bare engine run to a full
//! driver round streaming events over the bus.

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use qkd_01_protocol::{Bb84Session, EveConfig, NoiseModel, SessionConfig};
    use shared_bus::{EventFilter, NetworkEvent};
    use shared_types::SessionResult;
    use sim_runtime::{RuntimeConfig, SimulationDriver};

    fn run(config: SessionConfig, seed: u64) -> SessionResult {
        Bb84Session::new(config, StdRng::seed_from_u64(seed))
            .unwrap()
            .prepare()
            .run_to_completion()
            .into_result()
    }

    #[test]
    fn test_noiseless_session_produces_a_clean_half_length_key() {
        let result = run(SessionConfig::noiseless(256), 3);

        assert_eq!(result.requested_len, 256);
        assert_eq!(result.raw_count, 256);
        assert_eq!(result.lost_count, 0);
        assert!(result.sifted_len() <= 256);
        // Basis agreement is a fair coin per photon; ~128 expected.
        assert!((80..=176).contains(&result.sifted_len()));
        assert_eq!(result.qber, 0.0);
        assert!(!result.detected);
        assert_eq!(
            result.final_key.len(),
            (result.sifted_len() / 2).min(256)
        );
        assert!(!result.qber_history.is_empty());
        assert!(result.qber_history.iter().all(|&q| q == 0.0));
    }

    #[test]
    fn test_full_interception_is_detected_with_quarter_error_rate() {
        let config = SessionConfig::noiseless(500).with_eve(EveConfig::intercept_resend(1.0));
        let result = run(config, 5);

        assert!(result.detected);
        assert!(result.qber > 0.15 && result.qber < 0.35);
        assert!(result.final_key.is_empty());
    }

    #[test]
    fn test_lossy_channel_reports_lost_photons() {
        let noise = NoiseModel {
            photon_loss: 0.5,
            depolarization: 0.0,
            dark_count: 0.0,
        };
        let config = SessionConfig {
            key_length: 1024,
            noise,
            eve: None,
        };
        let result = run(config, 7);

        assert!(result.lost_count > 300);
        assert_eq!(result.raw_count, 1024);
        assert!(result.sifted_len() <= result.raw_count - result.lost_count);
        assert!(!result.detected);
    }

    #[tokio::test]
    async fn test_driver_round_streams_the_whole_session() {
        let config = RuntimeConfig {
            seed: Some(31),
            photons_per_session: 256,
            noise: NoiseModel::noiseless(),
            ..RuntimeConfig::default()
        };
        let driver = SimulationDriver::new(config).unwrap();
        let mut subscription = driver.bus().subscribe(EventFilter::all());

        let summary = driver.run_round().await.unwrap();
        assert!(summary.stored_key.is_some());

        let mut events = Vec::new();
        while let Ok(Some(event)) = subscription.try_recv() {
            events.push(event);
        }

        let photons = events
            .iter()
            .filter(|e| matches!(e, NetworkEvent::PhotonProcessed { .. }))
            .count();
        assert_eq!(photons, 256);

        let complete_at = events
            .iter()
            .position(|e| matches!(e, NetworkEvent::SessionComplete { .. }))
            .unwrap();
        let key_at = events
            .iter()
            .position(|e| matches!(e, NetworkEvent::KeyGenerated { .. }))
            .unwrap();
        assert!(complete_at > photons - 1);
        assert!(key_at > complete_at);
    }
}
