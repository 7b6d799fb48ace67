//! # Network Topology
//!
//! The single owning structure for all nodes and links. Nodes and links
//! are addressed by stable ids; the controller is the sole mutator, so
//! mutation stays behind `pub(crate)` seams.

use crate::config::TopologySpec;
use rand::Rng;
use shared_types::{LinkId, NetworkLink, NetworkNode, NodeId};
use std::collections::HashMap;

/// Per-direction latency is drawn uniformly from this range (ms).
const LATENCY_RANGE_MS: std::ops::Range<f64> = 2.0..10.0;

/// The owned graph of nodes and directed links.
#[derive(Debug, Clone)]
pub struct NetworkTopology {
    nodes: HashMap<NodeId, NetworkNode>,
    links: HashMap<LinkId, NetworkLink>,
    adjacency: HashMap<NodeId, Vec<LinkId>>,
}

impl NetworkTopology {
    /// Materialize a blueprint.
    ///
    /// Each undirected edge becomes two directed links at the baseline
    /// error rate, with independently drawn latencies.
    pub fn build<R: Rng>(spec: &TopologySpec, baseline_error_rate: f64, rng: &mut R) -> Self {
        let mut topology = Self {
            nodes: HashMap::new(),
            links: HashMap::new(),
            adjacency: HashMap::new(),
        };
        for node in &spec.nodes {
            topology.nodes.insert(node.id.clone(), node.clone());
            topology.adjacency.entry(node.id.clone()).or_default();
        }
        for (a, b) in &spec.edges {
            let forward = LinkId::new(a.clone(), b.clone());
            let backward = forward.reversed();
            for id in [forward, backward] {
                let latency = rng.gen_range(LATENCY_RANGE_MS);
                topology.insert_link(NetworkLink::new(id, baseline_error_rate, latency));
            }
        }
        topology
    }

    fn insert_link(&mut self, link: NetworkLink) {
        self.adjacency
            .entry(link.id.src.clone())
            .or_default()
            .push(link.id.clone());
        self.links.insert(link.id.clone(), link);
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&NetworkNode> {
        self.nodes.get(id)
    }

    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut NetworkNode> {
        self.nodes.get_mut(id)
    }

    /// Look up a directed link.
    #[must_use]
    pub fn link(&self, id: &LinkId) -> Option<&NetworkLink> {
        self.links.get(id)
    }

    pub(crate) fn link_mut(&mut self, id: &LinkId) -> Option<&mut NetworkLink> {
        self.links.get_mut(id)
    }

    /// All nodes, unordered.
    pub fn nodes(&self) -> impl Iterator<Item = &NetworkNode> {
        self.nodes.values()
    }

    /// All directed links, unordered.
    pub fn links(&self) -> impl Iterator<Item = &NetworkLink> {
        self.links.values()
    }

    pub(crate) fn links_mut(&mut self) -> impl Iterator<Item = &mut NetworkLink> {
        self.links.values_mut()
    }

    pub(crate) fn nodes_mut(&mut self) -> impl Iterator<Item = &mut NetworkNode> {
        self.nodes.values_mut()
    }

    /// Directed links leaving `node`.
    pub fn outgoing(&self, node: &NodeId) -> impl Iterator<Item = &NetworkLink> + '_ {
        self.adjacency
            .get(node)
            .into_iter()
            .flatten()
            .filter_map(|id| self.links.get(id))
    }

    /// Number of nodes.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of directed links.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.links.len()
    }
}
