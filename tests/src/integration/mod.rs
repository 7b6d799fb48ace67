//! Cross-subsystem integration flows.

pub mod detection_flow;
pub mod eavesdropper_suite;
pub mod key_lifecycle;
pub mod session_scenarios;
