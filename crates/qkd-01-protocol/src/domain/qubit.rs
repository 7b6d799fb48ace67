//! # Qubit Model
//!
//! A transmitted photon reduced to the two classical facts BB84 exposes:
//! the encoded bit and the preparation basis. Polarization is a pure
//! function of the two, so it is derived, never stored.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Measurement basis for one photon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Basis {
    /// `+`: polarizations 0° and 90°.
    Rectilinear,
    /// `x`: polarizations 45° and 135°.
    Diagonal,
}

impl Basis {
    /// Draw a basis uniformly at random.
    pub fn random<R: Rng>(rng: &mut R) -> Self {
        if rng.gen_bool(0.5) {
            Self::Rectilinear
        } else {
            Self::Diagonal
        }
    }

    /// Conventional one-character symbol.
    #[must_use]
    pub fn symbol(&self) -> char {
        match self {
            Self::Rectilinear => '+',
            Self::Diagonal => 'x',
        }
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// One in-flight photon.
///
/// Created once per protocol step, measured at most twice (an optional
/// eavesdropper, then the receiver), then discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Qubit {
    bit: bool,
    basis: Basis,
}

impl Qubit {
    /// Encode a bit in a basis.
    #[must_use]
    pub fn encode(bit: bool, basis: Basis) -> Self {
        Self { bit, basis }
    }

    /// The currently encoded bit.
    #[must_use]
    pub fn bit(&self) -> bool {
        self.bit
    }

    /// The current preparation basis.
    #[must_use]
    pub fn basis(&self) -> Basis {
        self.basis
    }

    /// Polarization angle in degrees, derived from (bit, basis).
    #[must_use]
    pub fn polarization_deg(&self) -> f64 {
        match (self.basis, self.bit) {
            (Basis::Rectilinear, false) => 0.0,
            (Basis::Rectilinear, true) => 90.0,
            (Basis::Diagonal, false) => 45.0,
            (Basis::Diagonal, true) => 135.0,
        }
    }

    /// Measure in `basis`.
    ///
    /// A matching basis returns the encoded bit and leaves the qubit
    /// untouched. A mismatched basis returns a uniformly random bit and
    /// collapses the qubit into the measuring basis with that bit; the
    /// collapse is what makes a wrong-basis interceptor detectable
    /// downstream.
    pub fn measure<R: Rng>(&mut self, basis: Basis, rng: &mut R) -> bool {
        if basis == self.basis {
            return self.bit;
        }
        let outcome = rng.gen_bool(0.5);
        self.bit = outcome;
        self.basis = basis;
        outcome
    }

    /// Flip the encoded bit in place, keeping the basis.
    pub(crate) fn flip(&mut self) {
        self.bit = !self.bit;
    }

    /// A fresh qubit with uniformly random bit and basis.
    pub(crate) fn random<R: Rng>(rng: &mut R) -> Self {
        Self {
            bit: rng.gen_bool(0.5),
            basis: Basis::random(rng),
        }
    }
}
