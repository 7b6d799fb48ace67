//! Routing configuration and topology blueprints.

use crate::error::{RoutingError, RoutingResult};
use serde::{Deserialize, Serialize};
use shared_types::{NetworkNode, NodeId, NodeRole};

/// Error-rate band boundaries and controller behavior knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Rate at or above which a link is suspicious and alerts fire.
    pub warning_threshold: f64,
    /// Rate at or above which a link is compromised and unroutable.
    pub critical_threshold: f64,
    /// When false, path cost ignores error rates and alerts stop
    /// triggering reroutes. Inactive links stay unroutable either way.
    pub smart_routing: bool,
    /// Maximum node count per path during simple-path enumeration.
    pub max_path_depth: usize,
    /// Error rate links return to when attacks are cleared.
    pub baseline_error_rate: f64,
    /// Primary path source; reroutes target this endpoint pair.
    pub source: NodeId,
    /// Primary path sink.
    pub sink: NodeId,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            warning_threshold: 0.11,
            critical_threshold: 0.20,
            smart_routing: true,
            max_path_depth: 10,
            baseline_error_rate: 0.02,
            source: NodeId::new("A"),
            sink: NodeId::new("B"),
        }
    }
}

impl RoutingConfig {
    /// Reject configurations that cannot drive a controller.
    pub fn validate(&self) -> RoutingResult<()> {
        for (name, value) in [
            ("warning_threshold", self.warning_threshold),
            ("critical_threshold", self.critical_threshold),
            ("baseline_error_rate", self.baseline_error_rate),
        ] {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(RoutingError::InvalidConfig {
                    reason: format!("{name} must lie in [0, 1], got {value}"),
                });
            }
        }
        if self.warning_threshold >= self.critical_threshold {
            return Err(RoutingError::InvalidConfig {
                reason: format!(
                    "warning threshold {} must be below critical threshold {}",
                    self.warning_threshold, self.critical_threshold
                ),
            });
        }
        if self.max_path_depth == 0 {
            return Err(RoutingError::InvalidConfig {
                reason: "max_path_depth must be non-zero".to_owned(),
            });
        }
        Ok(())
    }
}

/// Blueprint for a topology: nodes plus undirected edges.
///
/// Each undirected edge is installed as two directed links with
/// independently drawn latencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySpec {
    /// All nodes, endpoints and relays alike.
    pub nodes: Vec<NetworkNode>,
    /// Undirected edges between node ids.
    pub edges: Vec<(NodeId, NodeId)>,
}

impl TopologySpec {
    /// The default six-node mesh: endpoints `A` and `B` joined through
    /// relays `R1..R4`, with two disjoint relay layers.
    #[must_use]
    pub fn default_mesh() -> Self {
        let nodes = vec![
            NetworkNode::new("A", NodeRole::Source, (60.0, 300.0)),
            NetworkNode::new("R1", NodeRole::Relay, (260.0, 140.0)),
            NetworkNode::new("R2", NodeRole::Relay, (260.0, 460.0)),
            NetworkNode::new("R3", NodeRole::Relay, (520.0, 140.0)),
            NetworkNode::new("R4", NodeRole::Relay, (520.0, 460.0)),
            NetworkNode::new("B", NodeRole::Sink, (720.0, 300.0)),
        ];
        let edges = [
            ("A", "R1"),
            ("A", "R2"),
            ("R1", "R3"),
            ("R1", "R4"),
            ("R2", "R3"),
            ("R2", "R4"),
            ("R3", "B"),
            ("R4", "B"),
        ]
        .into_iter()
        .map(|(a, b)| (NodeId::new(a), NodeId::new(b)))
        .collect();
        Self { nodes, edges }
    }
}
