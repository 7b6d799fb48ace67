//! Error types for the routing controller.
//!
//! Unreachable destinations are not errors; path queries return `None`
//! or an empty result for them. Errors here cover unknown identifiers
//! and configurations rejected at the boundary.

use shared_types::LinkId;
use thiserror::Error;

/// Routing controller errors.
#[derive(Debug, Error)]
pub enum RoutingError {
    /// The named link does not exist in the topology.
    #[error("unknown link: {link}")]
    UnknownLink { link: LinkId },

    /// Configuration rejected at the boundary.
    #[error("invalid routing config: {reason}")]
    InvalidConfig { reason: String },
}

/// Result type for routing operations.
pub type RoutingResult<T> = Result<T, RoutingError>;
