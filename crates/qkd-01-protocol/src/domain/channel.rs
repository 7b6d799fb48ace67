//! # Quantum Channel
//!
//! Probabilistic noise applied to each photon in transit. Stages run in a
//! fixed order and at most one applies per photon: loss, then
//! depolarization, then dark count.

use crate::domain::qubit::Qubit;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Per-photon noise probabilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NoiseModel {
    /// Probability the photon never arrives.
    pub photon_loss: f64,
    /// Probability the encoded bit flips in place.
    pub depolarization: f64,
    /// Probability the detector fires on a spurious, independent photon.
    pub dark_count: f64,
}

impl Default for NoiseModel {
    fn default() -> Self {
        Self {
            photon_loss: 0.05,
            depolarization: 0.02,
            dark_count: 0.001,
        }
    }
}

impl NoiseModel {
    /// A perfect channel.
    #[must_use]
    pub fn noiseless() -> Self {
        Self {
            photon_loss: 0.0,
            depolarization: 0.0,
            dark_count: 0.0,
        }
    }
}

/// The lossy medium between sender and receiver.
#[derive(Debug, Clone, Copy)]
pub struct QuantumChannel {
    noise: NoiseModel,
}

impl QuantumChannel {
    /// Create a channel with the given noise model.
    #[must_use]
    pub fn new(noise: NoiseModel) -> Self {
        Self { noise }
    }

    /// The channel's noise model.
    #[must_use]
    pub fn noise(&self) -> NoiseModel {
        self.noise
    }

    /// Transmit one photon.
    ///
    /// Returns `None` when the photon is lost. Otherwise at most one of
    /// depolarization (bit flip) or dark count (replacement by a fresh
    /// random photon) applies.
    pub fn transmit<R: Rng>(&self, mut qubit: Qubit, rng: &mut R) -> Option<Qubit> {
        if self.noise.photon_loss > 0.0 && rng.gen_bool(self.noise.photon_loss) {
            return None;
        }
        if self.noise.depolarization > 0.0 && rng.gen_bool(self.noise.depolarization) {
            qubit.flip();
            return Some(qubit);
        }
        if self.noise.dark_count > 0.0 && rng.gen_bool(self.noise.dark_count) {
            return Some(Qubit::random(rng));
        }
        Some(qubit)
    }
}
