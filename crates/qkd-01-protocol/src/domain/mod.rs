//! Domain logic for the BB84 engine.

pub mod attacks;
pub mod channel;
pub mod engine;
pub mod qubit;
pub mod session;
