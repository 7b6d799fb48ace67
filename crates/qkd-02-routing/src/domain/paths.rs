//! # Simple-Path Enumeration
//!
//! Depth-bounded DFS used to answer reachability questions the cost
//! search cannot: "does any clean corridor remain", and "how many
//! distinct corridors exist at all". Only active links are walked;
//! the depth bound caps hop count so dense meshes stay tractable.

use crate::domain::topology::NetworkTopology;
use shared_types::NodeId;
use std::collections::HashSet;

/// Enumerate every simple path from `src` to `dst` of at most
/// `max_depth` hops, walking active links regardless of compromise.
#[must_use]
pub fn all_simple_paths(
    topology: &NetworkTopology,
    src: &NodeId,
    dst: &NodeId,
    max_depth: usize,
) -> Vec<Vec<NodeId>> {
    let mut found = Vec::new();
    if topology.node(src).is_none() || topology.node(dst).is_none() {
        return found;
    }
    let mut visited = HashSet::from([src.clone()]);
    let mut path = vec![src.clone()];
    walk(
        topology,
        dst,
        max_depth,
        false,
        &mut visited,
        &mut path,
        &mut found,
        false,
    );
    found
}

/// True when at least one bounded simple path from `src` to `dst`
/// crosses no compromised link.
#[must_use]
pub fn safe_path_exists(
    topology: &NetworkTopology,
    src: &NodeId,
    dst: &NodeId,
    max_depth: usize,
) -> bool {
    if topology.node(src).is_none() || topology.node(dst).is_none() {
        return false;
    }
    let mut visited = HashSet::from([src.clone()]);
    let mut path = vec![src.clone()];
    let mut found = Vec::new();
    walk(
        topology,
        dst,
        max_depth,
        true,
        &mut visited,
        &mut path,
        &mut found,
        true,
    )
}

/// Recursive step. Returns true once a path lands on `dst`, which
/// short-circuits the whole walk when `stop_at_first` is set.
#[allow(clippy::too_many_arguments)]
fn walk(
    topology: &NetworkTopology,
    dst: &NodeId,
    max_depth: usize,
    skip_compromised: bool,
    visited: &mut HashSet<NodeId>,
    path: &mut Vec<NodeId>,
    found: &mut Vec<Vec<NodeId>>,
    stop_at_first: bool,
) -> bool {
    let current = match path.last() {
        Some(node) => node.clone(),
        None => return false,
    };
    if current == *dst {
        found.push(path.clone());
        return true;
    }
    if path.len() > max_depth {
        return false;
    }

    let mut hit = false;
    let next: Vec<NodeId> = topology
        .outgoing(&current)
        .filter(|link| link.active && !(skip_compromised && link.compromised))
        .map(|link| link.id.dst.clone())
        .collect();
    for node in next {
        if !visited.insert(node.clone()) {
            continue;
        }
        path.push(node.clone());
        let reached = walk(
            topology,
            dst,
            max_depth,
            skip_compromised,
            visited,
            path,
            found,
            stop_at_first,
        );
        path.pop();
        visited.remove(&node);
        if reached {
            hit = true;
            if stop_at_first {
                return true;
            }
        }
    }
    hit
}
