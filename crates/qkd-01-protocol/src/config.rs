//! Session configuration and the protocol's fixed security constants.

use crate::domain::channel::NoiseModel;
use crate::error::{ProtocolError, ProtocolResult};
use serde::{Deserialize, Serialize};
use shared_types::AttackKind;

/// Sifted-key error rate above which a session aborts as eavesdropped.
pub const QBER_ABORT_THRESHOLD: f64 = 0.11;

/// Upper bound on the privacy-amplified key length in bits.
pub const MAX_FINAL_KEY_BITS: usize = 256;

/// Eavesdropper configuration for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EveConfig {
    /// Which strategy to run.
    pub strategy: AttackKind,
    /// Intercept-resend: probability of intercepting each photon.
    pub intercept_rate: f64,
    /// PNS: probability a pulse carries more than one photon.
    pub multi_photon_rate: f64,
    /// PNS: whether single-photon pulses are blocked outright.
    pub block_single_photon: bool,
    /// Trojan-horse: probability the basis probe succeeds.
    pub probe_success_rate: f64,
    /// Trojan-horse: whether to measure in the learned (correct) basis.
    pub subsequent_intercept: bool,
}

impl Default for EveConfig {
    fn default() -> Self {
        Self {
            strategy: AttackKind::InterceptResend,
            intercept_rate: 1.0,
            multi_photon_rate: 0.15,
            block_single_photon: true,
            probe_success_rate: 0.40,
            subsequent_intercept: true,
        }
    }
}

impl EveConfig {
    /// An intercept-resend eavesdropper at the given rate.
    #[must_use]
    pub fn intercept_resend(intercept_rate: f64) -> Self {
        Self {
            strategy: AttackKind::InterceptResend,
            intercept_rate,
            ..Self::default()
        }
    }

    /// A photon-number-splitting eavesdropper with default rates.
    #[must_use]
    pub fn photon_number_splitting() -> Self {
        Self {
            strategy: AttackKind::PhotonNumberSplitting,
            ..Self::default()
        }
    }

    /// A trojan-horse eavesdropper with default rates.
    #[must_use]
    pub fn trojan_horse() -> Self {
        Self {
            strategy: AttackKind::TrojanHorse,
            ..Self::default()
        }
    }
}

/// Configuration for one protocol session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Number of photons to transmit.
    pub key_length: usize,
    /// Channel noise probabilities.
    pub noise: NoiseModel,
    /// Eavesdropper, if one is present on the channel.
    pub eve: Option<EveConfig>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            key_length: 512,
            noise: NoiseModel::default(),
            eve: None,
        }
    }
}

impl SessionConfig {
    /// A session over a perfect channel with no eavesdropper.
    #[must_use]
    pub fn noiseless(key_length: usize) -> Self {
        Self {
            key_length,
            noise: NoiseModel::noiseless(),
            eve: None,
        }
    }

    /// Attach an eavesdropper to this configuration.
    #[must_use]
    pub fn with_eve(mut self, eve: EveConfig) -> Self {
        self.eve = Some(eve);
        self
    }

    /// Reject configurations that cannot start a session.
    ///
    /// Probabilities must lie in `[0, 1]`; the photon count must be
    /// non-zero.
    pub fn validate(&self) -> ProtocolResult<()> {
        if self.key_length == 0 {
            return Err(ProtocolError::InvalidConfig {
                reason: "key_length must be non-zero".to_owned(),
            });
        }

        let probabilities = [
            ("photon_loss", self.noise.photon_loss),
            ("depolarization", self.noise.depolarization),
            ("dark_count", self.noise.dark_count),
        ];
        for (name, p) in probabilities {
            check_probability(name, p)?;
        }

        if let Some(eve) = &self.eve {
            check_probability("intercept_rate", eve.intercept_rate)?;
            check_probability("multi_photon_rate", eve.multi_photon_rate)?;
            check_probability("probe_success_rate", eve.probe_success_rate)?;
        }

        Ok(())
    }
}

fn check_probability(name: &str, p: f64) -> ProtocolResult<()> {
    if !(0.0..=1.0).contains(&p) || p.is_nan() {
        return Err(ProtocolError::InvalidConfig {
            reason: format!("{name} must be a probability in [0, 1], got {p}"),
        });
    }
    Ok(())
}
