//! # Eavesdropping Strategies
//!
//! Each strategy transforms one in-flight qubit and reports what it
//! learned. The statistical contracts matter more than the mechanics:
//!
//! | Strategy                 | Sifted QBER contribution        | Detectable |
//! |--------------------------|---------------------------------|------------|
//! | Intercept-resend         | `intercept_rate × 0.25`         | yes        |
//! | Photon-number-splitting  | 0 (throughput drops instead)    | no         |
//! | Trojan-horse             | 0 (measures in correct basis)   | no         |

use crate::config::EveConfig;
use crate::domain::qubit::{Basis, Qubit};
use crate::error::{ProtocolError, ProtocolResult};
use rand::rngs::StdRng;
use rand::Rng;
use shared_types::AttackKind;

/// What an eavesdropper learned from one photon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackRecord {
    /// Which strategy produced the record.
    pub kind: AttackKind,
    /// Zero-based index of the photon within the session.
    pub photon_index: usize,
    /// The bit the eavesdropper holds, if it obtained one.
    pub learned_bit: Option<bool>,
    /// The basis the eavesdropper used or learned.
    pub basis_used: Option<Basis>,
}

/// Result of running a strategy over one qubit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EveOutcome {
    /// The qubit travelling onward, or `None` when blocked.
    pub qubit: Option<Qubit>,
    /// A record, present only when the strategy acted on this photon.
    pub record: Option<AttackRecord>,
}

impl EveOutcome {
    fn untouched(qubit: Qubit) -> Self {
        Self {
            qubit: Some(qubit),
            record: None,
        }
    }
}

/// A pluggable transformation applied to each qubit before the channel.
pub trait EveStrategy: Send {
    /// Which attack this strategy implements.
    fn kind(&self) -> AttackKind;

    /// Act on one qubit.
    fn apply(&self, photon_index: usize, qubit: Qubit, rng: &mut StdRng) -> EveOutcome;
}

/// Measure in a random basis and re-emit the collapsed photon.
///
/// Half the interceptions guess the wrong basis, and half of those
/// produce a wrong bit at the receiver, so the expected sifted QBER
/// contribution is `intercept_rate × 0.25`.
#[derive(Debug, Clone, Copy)]
pub struct InterceptResend {
    /// Probability of intercepting each photon.
    pub intercept_rate: f64,
}

impl EveStrategy for InterceptResend {
    fn kind(&self) -> AttackKind {
        AttackKind::InterceptResend
    }

    fn apply(&self, photon_index: usize, mut qubit: Qubit, rng: &mut StdRng) -> EveOutcome {
        if self.intercept_rate <= 0.0 || !rng.gen_bool(self.intercept_rate) {
            return EveOutcome::untouched(qubit);
        }

        let guess = Basis::random(rng);
        let learned = qubit.measure(guess, rng);
        // The measurement collapsed the qubit; re-emitting it is exactly
        // re-encoding (learned, guess).
        EveOutcome {
            qubit: Some(qubit),
            record: Some(AttackRecord {
                kind: AttackKind::InterceptResend,
                photon_index,
                learned_bit: Some(learned),
                basis_used: Some(guess),
            }),
        }
    }
}

/// Split multi-photon pulses; block single-photon pulses.
///
/// A multi-photon pulse hands the eavesdropper a perfect copy while the
/// original passes untouched. A single-photon pulse is optionally blocked,
/// which lowers delivered-key throughput. Never flips a bit.
#[derive(Debug, Clone, Copy)]
pub struct PhotonNumberSplitting {
    /// Probability a pulse carries more than one photon.
    pub multi_photon_rate: f64,
    /// Whether single-photon pulses are blocked outright.
    pub block_single_photon: bool,
}

impl EveStrategy for PhotonNumberSplitting {
    fn kind(&self) -> AttackKind {
        AttackKind::PhotonNumberSplitting
    }

    fn apply(&self, photon_index: usize, qubit: Qubit, rng: &mut StdRng) -> EveOutcome {
        let multi_photon = self.multi_photon_rate > 0.0 && rng.gen_bool(self.multi_photon_rate);
        if multi_photon {
            // Full information, zero disturbance.
            return EveOutcome {
                qubit: Some(qubit),
                record: Some(AttackRecord {
                    kind: AttackKind::PhotonNumberSplitting,
                    photon_index,
                    learned_bit: Some(qubit.bit()),
                    basis_used: Some(qubit.basis()),
                }),
            };
        }

        if self.block_single_photon {
            return EveOutcome {
                qubit: None,
                record: None,
            };
        }
        EveOutcome::untouched(qubit)
    }
}

/// Probe the sender apparatus to learn the preparation basis.
///
/// A successful probe reveals the basis without touching the photon; a
/// subsequent measurement in that (correct) basis reads the bit with zero
/// disturbance. Never raises the QBER.
#[derive(Debug, Clone, Copy)]
pub struct TrojanHorse {
    /// Probability the basis probe succeeds.
    pub probe_success_rate: f64,
    /// Whether to measure in the learned basis after a successful probe.
    pub subsequent_intercept: bool,
}

impl EveStrategy for TrojanHorse {
    fn kind(&self) -> AttackKind {
        AttackKind::TrojanHorse
    }

    fn apply(&self, photon_index: usize, mut qubit: Qubit, rng: &mut StdRng) -> EveOutcome {
        if self.probe_success_rate <= 0.0 || !rng.gen_bool(self.probe_success_rate) {
            return EveOutcome::untouched(qubit);
        }

        let basis = qubit.basis();
        let learned_bit = if self.subsequent_intercept {
            // Matching-basis measurement is deterministic and leaves the
            // photon statistics intact.
            Some(qubit.measure(basis, rng))
        } else {
            None
        };
        EveOutcome {
            qubit: Some(qubit),
            record: Some(AttackRecord {
                kind: AttackKind::TrojanHorse,
                photon_index,
                learned_bit,
                basis_used: Some(basis),
            }),
        }
    }
}

/// Build the per-qubit strategy an [`EveConfig`] names.
///
/// `NoiseInjection` is a link-level attack handled by the routing layer
/// and is rejected here.
pub fn build_strategy(cfg: &EveConfig) -> ProtocolResult<Box<dyn EveStrategy>> {
    match cfg.strategy {
        AttackKind::InterceptResend => Ok(Box::new(InterceptResend {
            intercept_rate: cfg.intercept_rate,
        })),
        AttackKind::PhotonNumberSplitting => Ok(Box::new(PhotonNumberSplitting {
            multi_photon_rate: cfg.multi_photon_rate,
            block_single_photon: cfg.block_single_photon,
        })),
        AttackKind::TrojanHorse => Ok(Box::new(TrojanHorse {
            probe_success_rate: cfg.probe_success_rate,
            subsequent_intercept: cfg.subsequent_intercept,
        })),
        AttackKind::NoiseInjection => Err(ProtocolError::UnsupportedStrategy {
            kind: AttackKind::NoiseInjection,
        }),
    }
}
