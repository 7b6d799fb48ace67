//! # QKD Subsystem 1: BB84 Protocol Engine
//!
//! Simulates one BB84 key exchange at the level of classical statistics:
//! bit, basis, and measurement outcome. No Hilbert-space state vectors.
//!
//! ## Session lifecycle
//!
//! ```text
//! Bb84Session<Unprepared> ──prepare()──▶ Bb84Session<Prepared>
//!                                              │ step() × N
//!                                              ▼
//!                                     CompletedSession ◀──finish()──
//! ```
//!
//! `prepare` draws every sender bit/basis and receiver basis up front, so
//! driving the session one step at a time or in one burst produces the
//! same records for the same seed.
//!
//! ## Modules
//!
//! - [`domain::qubit`]: bit+basis encoding and measurement collapse
//! - [`domain::channel`]: loss / depolarization / dark-count noise
//! - [`domain::attacks`]: pluggable eavesdropping strategies
//! - [`domain::engine`]: the session state machine
//! - [`domain::session`]: photon records, sifting, privacy amplification

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod config;
pub mod domain;
pub mod error;

pub use config::{EveConfig, SessionConfig, MAX_FINAL_KEY_BITS, QBER_ABORT_THRESHOLD};
pub use domain::attacks::{
    build_strategy, AttackRecord, EveOutcome, EveStrategy, InterceptResend,
    PhotonNumberSplitting, TrojanHorse,
};
pub use domain::channel::{NoiseModel, QuantumChannel};
pub use domain::engine::{Bb84Session, CompletedSession, Prepared, Unprepared};
pub use domain::qubit::{Basis, Qubit};
pub use domain::session::{privacy_amplify, PhotonRecord};
pub use error::{ProtocolError, ProtocolResult};
