//! # Session State Machine
//!
//! Drives one BB84 exchange from preparation through stepping to the
//! summarized result. State transitions consume the session, so a
//! `Prepared` session cannot be prepared twice and a completed one cannot
//! step again; the compiler enforces the lifecycle.
//!
//! A caller that wants to abandon a partially-stepped session simply
//! drops it. Nothing outside the session mutates until `finish`.

use crate::config::{SessionConfig, QBER_ABORT_THRESHOLD};
use crate::domain::attacks::{build_strategy, AttackRecord, EveStrategy};
use crate::domain::channel::QuantumChannel;
use crate::domain::qubit::{Basis, Qubit};
use crate::domain::session::{privacy_amplify, PhotonRecord};
use crate::error::ProtocolResult;
use rand::rngs::StdRng;
use rand::Rng;
use shared_types::{PhotonProgress, SessionResult};
use std::collections::VecDeque;
use std::marker::PhantomData;
use tracing::{debug, info};

/// Intercept log capacity; oldest entries beyond this are dropped.
const INTERCEPT_LOG_CAP: usize = 500;

/// Rolling QBER history capacity.
const QBER_HISTORY_CAP: usize = 20;

/// A rolling QBER sample is taken every this many sifted bits.
const QBER_SAMPLE_EVERY: usize = 25;

/// Marker state: the session has drawn nothing yet.
pub struct Unprepared;

/// Marker state: all bits and bases are drawn; the session can step.
pub struct Prepared;

/// One photon's pre-drawn randomness.
#[derive(Debug, Clone, Copy)]
struct PlannedPhoton {
    sender_bit: bool,
    sender_basis: Basis,
    receiver_basis: Basis,
}

/// A BB84 session in state `State`.
pub struct Bb84Session<State = Unprepared> {
    config: SessionConfig,
    channel: QuantumChannel,
    strategy: Option<Box<dyn EveStrategy>>,
    rng: StdRng,
    plan: Vec<PlannedPhoton>,
    records: Vec<PhotonRecord>,
    cursor: usize,
    intercept_log: VecDeque<AttackRecord>,
    sifted_seen: usize,
    errors_seen: usize,
    qber_history: VecDeque<f64>,
    _state: PhantomData<State>,
}

impl<S> Bb84Session<S> {
    /// Move the session to another state, keeping all data.
    fn transition<T>(self) -> Bb84Session<T> {
        Bb84Session {
            config: self.config,
            channel: self.channel,
            strategy: self.strategy,
            rng: self.rng,
            plan: self.plan,
            records: self.records,
            cursor: self.cursor,
            intercept_log: self.intercept_log,
            sifted_seen: self.sifted_seen,
            errors_seen: self.errors_seen,
            qber_history: self.qber_history,
            _state: PhantomData,
        }
    }
}

impl Bb84Session<Unprepared> {
    /// Create a session from a validated configuration and a seeded RNG.
    ///
    /// Every probabilistic decision the session makes draws from `rng`,
    /// so equal seeds replay identical sessions.
    pub fn new(config: SessionConfig, rng: StdRng) -> ProtocolResult<Self> {
        config.validate()?;
        let strategy = match &config.eve {
            Some(eve) => Some(build_strategy(eve)?),
            None => None,
        };
        let channel = QuantumChannel::new(config.noise);
        Ok(Self {
            config,
            channel,
            strategy,
            rng,
            plan: Vec::new(),
            records: Vec::new(),
            cursor: 0,
            intercept_log: VecDeque::new(),
            sifted_seen: 0,
            errors_seen: 0,
            qber_history: VecDeque::new(),
            _state: PhantomData,
        })
    }

    /// Draw every sender bit/basis and receiver basis up front.
    ///
    /// Pre-drawing makes step-at-a-time and run-to-completion driving
    /// produce identical records for the same seed.
    #[must_use]
    pub fn prepare(mut self) -> Bb84Session<Prepared> {
        let photons = self.config.key_length;
        let mut plan = Vec::with_capacity(photons);
        for _ in 0..photons {
            plan.push(PlannedPhoton {
                sender_bit: self.rng.gen_bool(0.5),
                sender_basis: Basis::random(&mut self.rng),
                receiver_basis: Basis::random(&mut self.rng),
            });
        }
        debug!(
            photons,
            eve = self.strategy.is_some(),
            "session prepared"
        );
        self.plan = plan;
        self.transition()
    }
}

impl Bb84Session<Prepared> {
    /// Total photons this session will transmit.
    #[must_use]
    pub fn total_photons(&self) -> usize {
        self.plan.len()
    }

    /// Photons not yet stepped.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.plan.len() - self.cursor
    }

    /// Transmit the next photon.
    ///
    /// Encode, optionally eavesdrop, apply channel noise, and have the
    /// receiver measure if the photon arrived. Returns `None` once every
    /// planned photon has been stepped.
    pub fn step(&mut self) -> Option<PhotonProgress> {
        let planned = *self.plan.get(self.cursor)?;
        let index = self.cursor;
        self.cursor += 1;

        let encoded = Qubit::encode(planned.sender_bit, planned.sender_basis);
        let (after_eve, attack) = match &self.strategy {
            Some(strategy) => {
                let outcome = strategy.apply(index, encoded, &mut self.rng);
                (outcome.qubit, outcome.record)
            }
            None => (Some(encoded), None),
        };

        if let Some(entry) = attack {
            if self.intercept_log.len() == INTERCEPT_LOG_CAP {
                self.intercept_log.pop_front();
            }
            self.intercept_log.push_back(entry);
        }

        let delivered = after_eve.and_then(|q| self.channel.transmit(q, &mut self.rng));
        let (lost, receiver_bit) = match delivered {
            Some(mut qubit) => (
                false,
                Some(qubit.measure(planned.receiver_basis, &mut self.rng)),
            ),
            None => (true, None),
        };

        let record = PhotonRecord {
            index,
            sender_bit: planned.sender_bit,
            sender_basis: planned.sender_basis,
            eve_bit: attack.and_then(|a| a.learned_bit),
            eve_basis: attack.and_then(|a| a.basis_used),
            lost,
            receiver_basis: planned.receiver_basis,
            receiver_bit,
            bases_matched: planned.sender_basis == planned.receiver_basis,
            is_error: false,
        };

        if record.sifted() {
            self.sifted_seen += 1;
            if receiver_bit != Some(planned.sender_bit) {
                self.errors_seen += 1;
            }
            if self.sifted_seen % QBER_SAMPLE_EVERY == 0 {
                let sample = self.errors_seen as f64 / self.sifted_seen as f64;
                if self.qber_history.len() == QBER_HISTORY_CAP {
                    self.qber_history.pop_front();
                }
                self.qber_history.push_back(sample);
            }
        }

        let progress = record.progress();
        self.records.push(record);
        Some(progress)
    }

    /// Step every remaining photon, then summarize.
    #[must_use]
    pub fn run_to_completion(mut self) -> CompletedSession {
        while self.step().is_some() {}
        self.finish()
    }

    /// Sift, estimate the QBER, decide detection, and derive the final
    /// key.
    ///
    /// Sifted positions are those neither lost nor basis-mismatched. A
    /// QBER above [`QBER_ABORT_THRESHOLD`] flags the session as
    /// eavesdropped and yields no key. Zero sifted bits is not an error,
    /// merely no usable key.
    #[must_use]
    pub fn finish(mut self) -> CompletedSession {
        let mut sifted_sender = Vec::new();
        let mut sifted_receiver = Vec::new();
        let mut errors = 0usize;
        let mut lost_count = 0usize;

        for record in &mut self.records {
            if record.lost {
                lost_count += 1;
                continue;
            }
            if !record.bases_matched {
                continue;
            }
            let Some(receiver_bit) = record.receiver_bit else {
                continue;
            };
            sifted_sender.push(record.sender_bit);
            sifted_receiver.push(receiver_bit);
            if receiver_bit != record.sender_bit {
                record.is_error = true;
                errors += 1;
            }
        }

        let sifted_len = sifted_sender.len();
        let qber = if sifted_len == 0 {
            0.0
        } else {
            errors as f64 / sifted_len as f64
        };
        let detected = qber > QBER_ABORT_THRESHOLD;
        let final_key = if detected {
            Vec::new()
        } else {
            privacy_amplify(&sifted_sender)
        };

        if self.qber_history.len() == QBER_HISTORY_CAP {
            self.qber_history.pop_front();
        }
        self.qber_history.push_back(qber);

        info!(
            raw = self.records.len(),
            lost = lost_count,
            sifted = sifted_len,
            qber,
            detected,
            final_key_bits = final_key.len(),
            "session summarized"
        );

        let result = SessionResult {
            requested_len: self.config.key_length,
            raw_count: self.records.len(),
            lost_count,
            sifted_sender,
            sifted_receiver,
            qber,
            detected,
            final_key,
            qber_history: self.qber_history.iter().copied().collect(),
        };

        CompletedSession {
            result,
            records: self.records,
            intercept_log: self.intercept_log.into_iter().collect(),
        }
    }
}

/// A summarized session: the aggregate result plus the full audit trail.
pub struct CompletedSession {
    result: SessionResult,
    records: Vec<PhotonRecord>,
    intercept_log: Vec<AttackRecord>,
}

impl CompletedSession {
    /// The aggregate outcome.
    #[must_use]
    pub fn result(&self) -> &SessionResult {
        &self.result
    }

    /// Per-photon audit rows, with `is_error` flags set.
    #[must_use]
    pub fn records(&self) -> &[PhotonRecord] {
        &self.records
    }

    /// What the eavesdropper learned, oldest first, capped at 500.
    #[must_use]
    pub fn intercept_log(&self) -> &[AttackRecord] {
        &self.intercept_log
    }

    /// Take the result, discarding the audit trail.
    #[must_use]
    pub fn into_result(self) -> SessionResult {
        self.result
    }
}
