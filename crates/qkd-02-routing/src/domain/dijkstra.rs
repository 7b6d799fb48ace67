//! # Least-Risk Path Search
//!
//! Single-source Dijkstra over the directed topology. Edge cost is
//! `error_rate + latency_ms / 100` so risk dominates and latency breaks
//! ties; compromised links cost infinity by exclusion. With smart
//! routing off, the error-rate term drops and compromised links become
//! routable again, but inactive links never are.

use crate::domain::topology::NetworkTopology;
use shared_types::{NetworkLink, NodeId};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Latency contributes at 1/100 the weight of the error rate.
const LATENCY_COST_DIVISOR: f64 = 100.0;

/// Total path cost, ordered for the priority queue.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Cost(f64);

impl Eq for Cost {}

impl PartialOrd for Cost {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Cost {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Queue entry; `Reverse` semantics folded into the `Ord` impl.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Visit {
    cost: Cost,
    node: NodeId,
}

impl PartialOrd for Visit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Visit {
    fn cmp(&self, other: &Self) -> Ordering {
        // Min-heap: smaller cost sorts greater.
        other
            .cost
            .cmp(&self.cost)
            .then_with(|| other.node.cmp(&self.node))
    }
}

fn edge_cost(link: &NetworkLink, smart_routing: bool) -> Option<f64> {
    if !link.active {
        return None;
    }
    if smart_routing && link.compromised {
        return None;
    }
    let latency = link.latency_ms / LATENCY_COST_DIVISOR;
    if smart_routing {
        Some(link.error_rate + latency)
    } else {
        Some(latency)
    }
}

/// Find the cheapest path from `src` to `dst`.
///
/// Returns the node path (source first) and its total cost, or `None`
/// when `dst` is unreachable over routable links.
#[must_use]
pub fn shortest_path(
    topology: &NetworkTopology,
    src: &NodeId,
    dst: &NodeId,
    smart_routing: bool,
) -> Option<(Vec<NodeId>, f64)> {
    if topology.node(src).is_none() || topology.node(dst).is_none() {
        return None;
    }

    let mut dist: HashMap<NodeId, f64> = HashMap::new();
    let mut prev: HashMap<NodeId, NodeId> = HashMap::new();
    let mut heap = BinaryHeap::new();

    dist.insert(src.clone(), 0.0);
    heap.push(Visit {
        cost: Cost(0.0),
        node: src.clone(),
    });

    while let Some(Visit { cost, node }) = heap.pop() {
        if node == *dst {
            let mut path = vec![node];
            while let Some(parent) = prev.get(path.last()?) {
                path.push(parent.clone());
            }
            path.reverse();
            return Some((path, cost.0));
        }

        // Stale queue entry for an already-improved node.
        if dist.get(&node).is_some_and(|&d| cost.0 > d) {
            continue;
        }

        for link in topology.outgoing(&node) {
            let Some(weight) = edge_cost(link, smart_routing) else {
                continue;
            };
            let next_cost = cost.0 + weight;
            let improved = dist
                .get(&link.id.dst)
                .map_or(true, |&known| next_cost < known);
            if improved {
                dist.insert(link.id.dst.clone(), next_cost);
                prev.insert(link.id.dst.clone(), node.clone());
                heap.push(Visit {
                    cost: Cost(next_cost),
                    node: link.id.dst.clone(),
                });
            }
        }
    }

    None
}
