//! Runtime configuration assembled from environment variables.
//!
//! Every knob has a default that produces a complete, watchable run: six
//! rounds over the default mesh with realistic channel noise and no
//! adversary. `QKD_ATTACK` scripts an attack onto the active route
//! partway through.

use qkd_01_protocol::NoiseModel;
use qkd_02_routing::RoutingConfig;
use qkd_03_keystore::KeystoreConfig;
use shared_types::{AttackKind, PairId};
use tracing::warn;

/// Everything the simulation loop needs.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Master seed; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Number of generation rounds to run.
    pub rounds: usize,
    /// Photons transmitted per session.
    pub photons_per_session: usize,
    /// Pause between rounds, in milliseconds.
    pub round_delay_ms: u64,
    /// Channel noise every session starts from.
    pub noise: NoiseModel,
    /// Attack landed on the active route mid-run, if any.
    pub attack: Option<AttackKind>,
    /// One-based round the attack lands before.
    pub attack_round: usize,
    /// Routing controller configuration.
    pub routing: RoutingConfig,
    /// Keystore configuration.
    pub keystore: KeystoreConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            seed: None,
            rounds: 6,
            photons_per_session: 1024,
            round_delay_ms: 250,
            noise: NoiseModel::default(),
            attack: None,
            attack_round: 3,
            routing: RoutingConfig::default(),
            keystore: KeystoreConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Build a configuration from `QKD_*` environment variables, keeping
    /// the default for anything unset or unparseable.
    #[must_use]
    pub fn load_from_env() -> Self {
        let mut config = Self::default();

        if let Ok(seed) = std::env::var("QKD_SEED") {
            match seed.parse() {
                Ok(s) => config.seed = Some(s),
                Err(_) => warn!(value = %seed, "QKD_SEED must be an unsigned integer"),
            }
        }
        if let Ok(rounds) = std::env::var("QKD_ROUNDS") {
            if let Ok(n) = rounds.parse() {
                config.rounds = n;
            }
        }
        if let Ok(photons) = std::env::var("QKD_PHOTONS") {
            if let Ok(n) = photons.parse() {
                config.photons_per_session = n;
            }
        }
        if let Ok(delay) = std::env::var("QKD_ROUND_DELAY_MS") {
            if let Ok(ms) = delay.parse() {
                config.round_delay_ms = ms;
            }
        }
        if let Ok(kind) = std::env::var("QKD_ATTACK") {
            match kind.parse() {
                Ok(k) => config.attack = Some(k),
                Err(_) => warn!(value = %kind, "QKD_ATTACK does not name a known attack"),
            }
        }
        if let Ok(round) = std::env::var("QKD_ATTACK_ROUND") {
            if let Ok(n) = round.parse() {
                config.attack_round = n;
            }
        }
        if let Ok(flag) = std::env::var("QKD_SMART_ROUTING") {
            if let Ok(enabled) = flag.parse() {
                config.routing.smart_routing = enabled;
            }
        }

        config
    }

    /// The endpoint pair every session runs for.
    #[must_use]
    pub fn pair(&self) -> PairId {
        PairId::new(self.routing.source.clone(), self.routing.sink.clone())
    }
}
