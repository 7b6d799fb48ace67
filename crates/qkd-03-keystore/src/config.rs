//! Keystore configuration.

use crate::error::{KeystoreError, KeystoreResult};
use serde::{Deserialize, Serialize};

/// Default number of entries retained per pair.
pub const DEFAULT_POOL_CAPACITY: usize = 50;

/// Default QBER above which stored keys are invalidated.
pub const DEFAULT_INVALIDATION_THRESHOLD: f64 = 0.11;

/// Pool sizing and invalidation policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeystoreConfig {
    /// Entries retained per pair before non-active pruning kicks in.
    pub pool_capacity: usize,
    /// Keys recorded above this QBER are invalidated on alert handling.
    pub invalidation_threshold: f64,
}

impl Default for KeystoreConfig {
    fn default() -> Self {
        Self {
            pool_capacity: DEFAULT_POOL_CAPACITY,
            invalidation_threshold: DEFAULT_INVALIDATION_THRESHOLD,
        }
    }
}

impl KeystoreConfig {
    /// Reject configurations that cannot back a manager.
    pub fn validate(&self) -> KeystoreResult<()> {
        if self.pool_capacity == 0 {
            return Err(KeystoreError::InvalidConfig {
                reason: "pool_capacity must be non-zero".to_owned(),
            });
        }
        let t = self.invalidation_threshold;
        if !(0.0..=1.0).contains(&t) || t.is_nan() {
            return Err(KeystoreError::InvalidConfig {
                reason: format!("invalidation_threshold must lie in [0, 1], got {t}"),
            });
        }
        Ok(())
    }
}
