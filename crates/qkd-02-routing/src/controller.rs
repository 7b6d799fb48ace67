//! # Routing Controller
//!
//! The single mutator of the network graph. Every rate update, attack
//! injection, and recovery operation runs under one lock, and any alert
//! produced by an update is appended with the route already recomputed,
//! so observers never see an alert whose route is stale.

use crate::config::{RoutingConfig, TopologySpec};
use crate::domain::dijkstra::shortest_path;
use crate::domain::paths::safe_path_exists;
use crate::domain::topology::NetworkTopology;
use crate::error::{RoutingError, RoutingResult};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use shared_types::{
    now_millis, AlertThreshold, AttackKind, LinkId, NetworkLink, NetworkNode, NodeId, RouteAction,
    RouteAlert,
};
use std::ops::Range;
use tracing::{debug, info, warn};

/// Rate band an intercept-resend tap settles a link into. Centered on
/// the 25% signature the strategy leaves on sifted keys.
const INTERCEPT_RESEND_RATE: Range<f64> = 0.21..0.29;
/// Photon-number-splitting stays below the warning band.
const PNS_RATE: Range<f64> = 0.03..0.08;
/// Trojan-horse probing stays below the warning band.
const TROJAN_RATE: Range<f64> = 0.02..0.06;
/// Additive bump applied per noise injection.
const NOISE_BUMP: Range<f64> = 0.08..0.15;

/// What one link update did, returned to the caller for event mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkUpdateOutcome {
    /// The updated link.
    pub link: LinkId,
    /// Error rate before the update.
    pub rate_before: f64,
    /// Clamped error rate now on the link.
    pub rate_after: f64,
    /// Link compromise state after the update.
    pub compromised: bool,
    /// Alert appended by this update, if the warning band was entered.
    pub alert: Option<RouteAlert>,
    /// Route change caused by this update, if any.
    pub route_change: Option<RouteChange>,
    /// Node newly marked compromised by this update, if any.
    pub compromised_node: Option<NodeId>,
}

/// Aggregate outcome of a batch poison: per-link updates plus the one
/// shared route recomputation.
#[derive(Debug, Clone, PartialEq)]
pub struct PoisonOutcome {
    /// Per-link outcomes in request order, each without a route change.
    pub updates: Vec<LinkUpdateOutcome>,
    /// The single post-batch route change, if the route moved.
    pub route_change: Option<RouteChange>,
}

/// A change of the preferred source-to-sink path.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteChange {
    /// Path source.
    pub src: NodeId,
    /// Path sink.
    pub dst: NodeId,
    /// The new path, source first. Empty when the sink is unreachable.
    pub path: Vec<NodeId>,
    /// Cost of the new path, absent when unreachable.
    pub cost: Option<f64>,
}

/// Aggregate counters served from one consistent snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkHealth {
    /// Nodes in the topology.
    pub node_count: usize,
    /// Directed links in the topology.
    pub link_count: usize,
    /// Links currently active.
    pub active_links: usize,
    /// Links currently marked compromised.
    pub compromised_links: usize,
    /// Nodes currently marked compromised.
    pub compromised_nodes: usize,
    /// Mean error rate across all links.
    pub average_error_rate: f64,
    /// Alerts accumulated since construction or the last reset.
    pub alert_count: usize,
    /// Whether some bounded path avoids every compromised link.
    pub safe_path_available: bool,
}

/// Point-in-time copy of the graph, sorted for stable iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    /// All nodes, ordered by id.
    pub nodes: Vec<NetworkNode>,
    /// All directed links, ordered by (src, dst).
    pub links: Vec<NetworkLink>,
    /// The cached preferred path, if one exists.
    pub route: Option<Vec<NodeId>>,
}

/// Outcome of one raw rate application, before routing reacts.
#[derive(Debug)]
struct RawUpdate {
    rate_before: f64,
    rate_after: f64,
    link_compromised: bool,
    crossed_warning: bool,
    newly_compromised_node: Option<NodeId>,
}

struct Inner {
    config: RoutingConfig,
    spec: TopologySpec,
    topology: NetworkTopology,
    route: Option<(Vec<NodeId>, f64)>,
    alerts: Vec<RouteAlert>,
    rng: StdRng,
}

/// Thread-safe owner of the topology, the route cache, and the alert log.
pub struct RoutingController {
    inner: Mutex<Inner>,
}

impl RoutingController {
    /// Build a controller over the given topology blueprint.
    ///
    /// Validates the configuration, installs every undirected edge as a
    /// directed link pair, and computes the initial route.
    pub fn new(config: RoutingConfig, spec: TopologySpec, mut rng: StdRng) -> RoutingResult<Self> {
        config.validate()?;
        for endpoint in [&config.source, &config.sink] {
            if !spec.nodes.iter().any(|n| n.id == *endpoint) {
                return Err(RoutingError::InvalidConfig {
                    reason: format!("endpoint {endpoint} missing from topology"),
                });
            }
        }
        let topology = NetworkTopology::build(&spec, config.baseline_error_rate, &mut rng);
        let route = shortest_path(&topology, &config.source, &config.sink, config.smart_routing);
        info!(
            nodes = topology.node_count(),
            links = topology.link_count(),
            hops = route.as_ref().map_or(0, |(p, _)| p.len()),
            "routing controller ready"
        );
        Ok(Self {
            inner: Mutex::new(Inner {
                config,
                spec,
                topology,
                route,
                alerts: Vec::new(),
                rng,
            }),
        })
    }

    /// Build a controller over the default six-node mesh.
    pub fn with_default_mesh(config: RoutingConfig, rng: StdRng) -> RoutingResult<Self> {
        Self::new(config, TopologySpec::default_mesh(), rng)
    }

    /// Record a new measured error rate on a link.
    ///
    /// The rate is clamped to `[0, 1]`. Crossing the critical threshold
    /// marks the link (and its destination node) compromised; dropping
    /// below the warning threshold clears the link again. An upward
    /// crossing of the warning threshold recomputes the route and
    /// appends an alert before this call returns.
    pub fn update_link_error_rate(
        &self,
        link: &LinkId,
        new_rate: f64,
        attack: Option<AttackKind>,
    ) -> RoutingResult<LinkUpdateOutcome> {
        self.inner.lock().update(link, new_rate, attack)
    }

    /// Inject a named attack on one link, drawing its rate from the
    /// attack's signature band.
    pub fn inject_attack(
        &self,
        link: &LinkId,
        kind: AttackKind,
    ) -> RoutingResult<LinkUpdateOutcome> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let current = inner
            .topology
            .link(link)
            .ok_or_else(|| RoutingError::UnknownLink { link: link.clone() })?
            .error_rate;
        let rate = inner.attack_rate(kind, current);
        inner.update(link, rate, Some(kind))
    }

    /// Apply a batch of rate updates, then recompute the route once.
    ///
    /// Every link id is checked before anything is applied, so an
    /// unknown id leaves the graph untouched. All alerts raised by the
    /// batch share the single post-batch routing action.
    pub fn poison_links(
        &self,
        updates: &[(LinkId, f64)],
        attack: Option<AttackKind>,
    ) -> RoutingResult<PoisonOutcome> {
        self.inner.lock().poison(updates, attack)
    }

    /// Poison `count` randomly chosen undirected edges with a named
    /// attack, both directions per edge at the same drawn rate.
    pub fn random_poison(&self, count: usize, kind: AttackKind) -> RoutingResult<PoisonOutcome> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let edges: Vec<(NodeId, NodeId)> = inner
            .spec
            .edges
            .choose_multiple(&mut inner.rng, count)
            .cloned()
            .collect();
        let mut updates = Vec::with_capacity(edges.len() * 2);
        for (a, b) in edges {
            let forward = LinkId {
                src: a.clone(),
                dst: b.clone(),
            };
            let current = inner
                .topology
                .link(&forward)
                .map_or(inner.config.baseline_error_rate, |l| l.error_rate);
            let rate = inner.attack_rate(kind, current);
            updates.push((forward.reversed(), rate));
            updates.push((forward, rate));
        }
        inner.poison(&updates, Some(kind))
    }

    /// Restore every link to the baseline rate and clear all compromise
    /// flags and attack labels. The alert log is kept.
    pub fn clear_all_attacks(&self) -> Option<RouteChange> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let baseline = inner.config.baseline_error_rate;
        for link in inner.topology.links_mut() {
            link.error_rate = baseline;
            link.compromised = false;
            link.attack = None;
        }
        for node in inner.topology.nodes_mut() {
            node.compromised = false;
        }
        info!("all attacks cleared");
        inner.recompute_route()
    }

    /// Rebuild the topology from its blueprint with fresh latencies and
    /// empty the alert log.
    pub fn reset(&self) -> Option<RouteChange> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.topology =
            NetworkTopology::build(&inner.spec, inner.config.baseline_error_rate, &mut inner.rng);
        inner.alerts.clear();
        info!("topology reset");
        inner.recompute_route()
    }

    /// Toggle risk-aware routing and recompute the route under the new
    /// cost function.
    pub fn set_smart_routing(&self, enabled: bool) -> Option<RouteChange> {
        let mut guard = self.inner.lock();
        if guard.config.smart_routing == enabled {
            return None;
        }
        guard.config.smart_routing = enabled;
        info!(enabled, "smart routing toggled");
        guard.recompute_route()
    }

    /// Whether risk-aware routing is currently enabled.
    #[must_use]
    pub fn smart_routing(&self) -> bool {
        self.inner.lock().config.smart_routing
    }

    /// True when at least one bounded simple path from source to sink
    /// avoids every compromised link.
    #[must_use]
    pub fn can_route_safely(&self) -> bool {
        let guard = self.inner.lock();
        safe_path_exists(
            &guard.topology,
            &guard.config.source,
            &guard.config.sink,
            guard.config.max_path_depth,
        )
    }

    /// The cached preferred path, source first.
    #[must_use]
    pub fn current_route(&self) -> Option<Vec<NodeId>> {
        self.inner.lock().route.as_ref().map(|(p, _)| p.clone())
    }

    /// Compute the best path on the current graph without touching the
    /// route cache.
    #[must_use]
    pub fn best_path(&self) -> Option<(Vec<NodeId>, f64)> {
        let guard = self.inner.lock();
        shortest_path(
            &guard.topology,
            &guard.config.source,
            &guard.config.sink,
            guard.config.smart_routing,
        )
    }

    /// Copy of the append-only alert log, oldest first.
    #[must_use]
    pub fn alerts(&self) -> Vec<RouteAlert> {
        self.inner.lock().alerts.clone()
    }

    /// Aggregate health counters from one consistent view of the graph.
    #[must_use]
    pub fn network_health(&self) -> NetworkHealth {
        let guard = self.inner.lock();
        let link_count = guard.topology.link_count();
        let average_error_rate = if link_count == 0 {
            0.0
        } else {
            guard.topology.links().map(|l| l.error_rate).sum::<f64>() / link_count as f64
        };
        NetworkHealth {
            node_count: guard.topology.node_count(),
            link_count,
            active_links: guard.topology.links().filter(|l| l.active).count(),
            compromised_links: guard.topology.links().filter(|l| l.compromised).count(),
            compromised_nodes: guard.topology.nodes().filter(|n| n.compromised).count(),
            average_error_rate,
            alert_count: guard.alerts.len(),
            safe_path_available: safe_path_exists(
                &guard.topology,
                &guard.config.source,
                &guard.config.sink,
                guard.config.max_path_depth,
            ),
        }
    }

    /// Sorted copy of the whole graph plus the cached route.
    #[must_use]
    pub fn snapshot(&self) -> TopologySnapshot {
        let guard = self.inner.lock();
        let mut nodes: Vec<NetworkNode> = guard.topology.nodes().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        let mut links: Vec<NetworkLink> = guard.topology.links().cloned().collect();
        links.sort_by(|a, b| {
            (a.id.src.as_str(), a.id.dst.as_str()).cmp(&(b.id.src.as_str(), b.id.dst.as_str()))
        });
        TopologySnapshot {
            nodes,
            links,
            route: guard.route.as_ref().map(|(p, _)| p.clone()),
        }
    }
}

impl Inner {
    /// Apply one clamped rate to a link and maintain the compromise
    /// invariants on the link and its destination node.
    fn apply_rate(
        &mut self,
        id: &LinkId,
        new_rate: f64,
        attack: Option<AttackKind>,
    ) -> RoutingResult<RawUpdate> {
        let warning = self.config.warning_threshold;
        let critical = self.config.critical_threshold;

        let (rate_before, rate_after, was_compromised, now_compromised, dst) = {
            let link = self
                .topology
                .link_mut(id)
                .ok_or_else(|| RoutingError::UnknownLink { link: id.clone() })?;
            let rate_before = link.error_rate;
            let rate_after = new_rate.clamp(0.0, 1.0);
            link.error_rate = rate_after;
            if attack.is_some() {
                link.attack = attack;
            }
            let was = link.compromised;
            if rate_after >= critical {
                link.compromised = true;
            } else if rate_after < warning {
                link.compromised = false;
            }
            (rate_before, rate_after, was, link.compromised, link.id.dst.clone())
        };

        // A node stays compromised while any incoming compromised link
        // terminates at it.
        let mut newly_compromised_node = None;
        if now_compromised && !was_compromised {
            if let Some(node) = self.topology.node_mut(&dst) {
                if !node.compromised {
                    node.compromised = true;
                    newly_compromised_node = Some(dst.clone());
                }
            }
        } else if was_compromised && !now_compromised {
            let still_threatened = self
                .topology
                .links()
                .any(|l| l.compromised && l.id.dst == dst);
            if !still_threatened {
                if let Some(node) = self.topology.node_mut(&dst) {
                    node.compromised = false;
                }
            }
        }

        Ok(RawUpdate {
            rate_before,
            rate_after,
            link_compromised: now_compromised,
            crossed_warning: rate_before < warning && rate_after >= warning,
            newly_compromised_node,
        })
    }

    fn update(
        &mut self,
        id: &LinkId,
        new_rate: f64,
        attack: Option<AttackKind>,
    ) -> RoutingResult<LinkUpdateOutcome> {
        let raw = self.apply_rate(id, new_rate, attack)?;
        let mut outcome = LinkUpdateOutcome {
            link: id.clone(),
            rate_before: raw.rate_before,
            rate_after: raw.rate_after,
            compromised: raw.link_compromised,
            alert: None,
            route_change: None,
            compromised_node: raw.newly_compromised_node.clone(),
        };
        if raw.crossed_warning {
            let action = if self.config.smart_routing {
                outcome.route_change = self.recompute_route();
                match &self.route {
                    Some((path, _)) => RouteAction::Rerouted(path.clone()),
                    None => RouteAction::NoAlternatePath,
                }
            } else {
                RouteAction::RoutingDisabled
            };
            outcome.alert = Some(self.push_alert(id, &raw, action, attack));
        } else {
            debug!(link = %id, rate = raw.rate_after, "link rate updated");
        }
        Ok(outcome)
    }

    fn poison(
        &mut self,
        updates: &[(LinkId, f64)],
        attack: Option<AttackKind>,
    ) -> RoutingResult<PoisonOutcome> {
        for (id, _) in updates {
            if self.topology.link(id).is_none() {
                return Err(RoutingError::UnknownLink { link: id.clone() });
            }
        }
        let mut raws = Vec::with_capacity(updates.len());
        for (id, rate) in updates {
            raws.push((id.clone(), self.apply_rate(id, *rate, attack)?));
        }

        let any_crossed = raws.iter().any(|(_, r)| r.crossed_warning);
        let mut route_change = None;
        let action = if !any_crossed {
            None
        } else if self.config.smart_routing {
            route_change = self.recompute_route();
            Some(match &self.route {
                Some((path, _)) => RouteAction::Rerouted(path.clone()),
                None => RouteAction::NoAlternatePath,
            })
        } else {
            Some(RouteAction::RoutingDisabled)
        };

        let mut outcomes = Vec::with_capacity(raws.len());
        for (id, raw) in raws {
            let alert = match (&action, raw.crossed_warning) {
                (Some(action), true) => Some(self.push_alert(&id, &raw, action.clone(), attack)),
                _ => None,
            };
            outcomes.push(LinkUpdateOutcome {
                link: id,
                rate_before: raw.rate_before,
                rate_after: raw.rate_after,
                compromised: raw.link_compromised,
                alert,
                route_change: None,
                compromised_node: raw.newly_compromised_node,
            });
        }
        Ok(PoisonOutcome {
            updates: outcomes,
            route_change,
        })
    }

    /// Recompute the cached route. Returns a change only when the node
    /// path actually moved.
    fn recompute_route(&mut self) -> Option<RouteChange> {
        let next = shortest_path(
            &self.topology,
            &self.config.source,
            &self.config.sink,
            self.config.smart_routing,
        );
        let changed = match (&self.route, &next) {
            (Some((old, _)), Some((new, _))) => old != new,
            (None, None) => false,
            _ => true,
        };
        self.route = next;
        if !changed {
            return None;
        }
        Some(RouteChange {
            src: self.config.source.clone(),
            dst: self.config.sink.clone(),
            path: self
                .route
                .as_ref()
                .map(|(p, _)| p.clone())
                .unwrap_or_default(),
            cost: self.route.as_ref().map(|(_, c)| *c),
        })
    }

    fn push_alert(
        &mut self,
        id: &LinkId,
        raw: &RawUpdate,
        action: RouteAction,
        attack: Option<AttackKind>,
    ) -> RouteAlert {
        let threshold = if raw.rate_after >= self.config.critical_threshold {
            AlertThreshold::Critical
        } else {
            AlertThreshold::Warning
        };
        let alert = RouteAlert {
            at_ms: now_millis(),
            link: id.clone(),
            rate_before: raw.rate_before,
            rate_after: raw.rate_after,
            threshold,
            action,
            attack,
        };
        warn!(
            link = %id,
            rate = raw.rate_after,
            threshold = ?threshold,
            action = %alert.action,
            "error-rate threshold crossed"
        );
        self.alerts.push(alert.clone());
        alert
    }

    /// Draw a rate from the attack's signature band.
    fn attack_rate(&mut self, kind: AttackKind, current: f64) -> f64 {
        match kind {
            AttackKind::InterceptResend => self.rng.gen_range(INTERCEPT_RESEND_RATE),
            AttackKind::PhotonNumberSplitting => self.rng.gen_range(PNS_RATE),
            AttackKind::TrojanHorse => self.rng.gen_range(TROJAN_RATE),
            AttackKind::NoiseInjection => (current + self.rng.gen_range(NOISE_BUMP)).min(1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn controller() -> RoutingController {
        RoutingController::with_default_mesh(RoutingConfig::default(), StdRng::seed_from_u64(7))
            .expect("valid default controller")
    }

    fn first_hop(controller: &RoutingController) -> LinkId {
        let route = controller.current_route().expect("route exists");
        LinkId::new(route[0].clone(), route[1].clone())
    }

    #[test]
    fn test_initial_route_spans_endpoints() {
        let controller = controller();
        let route = controller.current_route().expect("route exists");
        assert_eq!(route.first(), Some(&NodeId::new("A")));
        assert_eq!(route.last(), Some(&NodeId::new("B")));
        assert!(controller.can_route_safely());
        assert!(controller.alerts().is_empty());
    }

    #[test]
    fn test_missing_endpoint_rejected() {
        let config = RoutingConfig {
            sink: NodeId::new("Z"),
            ..RoutingConfig::default()
        };
        let result = RoutingController::with_default_mesh(config, StdRng::seed_from_u64(1));
        assert!(matches!(result, Err(RoutingError::InvalidConfig { .. })));
    }

    #[test]
    fn test_subwarning_update_is_silent() {
        let controller = controller();
        let link = LinkId::new("A", "R1");
        let outcome = controller
            .update_link_error_rate(&link, 0.05, None)
            .expect("known link");
        assert_eq!(outcome.rate_after, 0.05);
        assert!(!outcome.compromised);
        assert!(outcome.alert.is_none());
        assert!(outcome.route_change.is_none());
        assert!(controller.alerts().is_empty());
    }

    #[test]
    fn test_rate_is_clamped() {
        let controller = controller();
        let link = LinkId::new("A", "R1");
        let outcome = controller
            .update_link_error_rate(&link, 3.5, None)
            .expect("known link");
        assert_eq!(outcome.rate_after, 1.0);
        assert!(outcome.compromised);
    }

    #[test]
    fn test_unknown_link_is_an_error() {
        let controller = controller();
        let result = controller.update_link_error_rate(&LinkId::new("A", "Z"), 0.5, None);
        assert!(matches!(result, Err(RoutingError::UnknownLink { .. })));
    }

    #[test]
    fn test_warning_crossing_alerts_and_reroutes() {
        let controller = controller();
        let hop = first_hop(&controller);
        let old_route = controller.current_route().expect("route exists");

        let outcome = controller
            .update_link_error_rate(&hop, 0.25, Some(AttackKind::InterceptResend))
            .expect("known link");

        assert!(outcome.compromised);
        assert_eq!(outcome.compromised_node, Some(hop.dst.clone()));
        let alert = outcome.alert.expect("crossing raises an alert");
        assert_eq!(alert.threshold, AlertThreshold::Critical);
        assert_eq!(alert.attack, Some(AttackKind::InterceptResend));

        // The alert's action already reflects the recomputed route.
        let new_route = controller.current_route().expect("alternate exists");
        assert_eq!(alert.action, RouteAction::Rerouted(new_route.clone()));
        assert_ne!(new_route, old_route);
        assert!(outcome.route_change.is_some());
        assert_eq!(controller.alerts().len(), 1);

        // The new route must not traverse the poisoned hop.
        let uses_hop = new_route
            .windows(2)
            .any(|w| w[0] == hop.src && w[1] == hop.dst);
        assert!(!uses_hop);
    }

    #[test]
    fn test_no_second_alert_above_warning() {
        let controller = controller();
        let link = LinkId::new("A", "R1");
        let first = controller
            .update_link_error_rate(&link, 0.15, None)
            .expect("known link");
        assert!(first.alert.is_some());
        let second = controller
            .update_link_error_rate(&link, 0.25, None)
            .expect("known link");
        assert!(second.alert.is_none());
        assert_eq!(controller.alerts().len(), 1);
    }

    #[test]
    fn test_hysteresis_clears_only_below_warning() {
        let controller = controller();
        let link = LinkId::new("A", "R1");
        controller
            .update_link_error_rate(&link, 0.25, None)
            .expect("known link");

        // Between warning and critical the link stays compromised.
        let mid = controller
            .update_link_error_rate(&link, 0.15, None)
            .expect("known link");
        assert!(mid.compromised);

        let low = controller
            .update_link_error_rate(&link, 0.05, None)
            .expect("known link");
        assert!(!low.compromised);

        let snapshot = controller.snapshot();
        let r1 = snapshot
            .nodes
            .iter()
            .find(|n| n.id == NodeId::new("R1"))
            .expect("node exists");
        assert!(!r1.compromised);
    }

    #[test]
    fn test_batch_poison_shares_one_action() {
        let controller = controller();
        // Sever both of A's corridors at once.
        let updates = vec![
            (LinkId::new("A", "R1"), 0.5),
            (LinkId::new("A", "R2"), 0.5),
        ];
        let outcome = controller
            .poison_links(&updates, Some(AttackKind::NoiseInjection))
            .expect("known links");

        assert_eq!(outcome.updates.len(), 2);
        let actions: Vec<RouteAction> = outcome
            .updates
            .iter()
            .filter_map(|u| u.alert.as_ref().map(|a| a.action.clone()))
            .collect();
        assert_eq!(actions.len(), 2);
        assert!(actions.iter().all(|a| *a == RouteAction::NoAlternatePath));

        let change = outcome.route_change.expect("route dropped");
        assert!(change.path.is_empty());
        assert!(change.cost.is_none());
        assert!(controller.current_route().is_none());
        assert!(!controller.can_route_safely());
    }

    #[test]
    fn test_batch_rejects_unknown_link_before_applying() {
        let controller = controller();
        let updates = vec![
            (LinkId::new("A", "R1"), 0.5),
            (LinkId::new("A", "Z"), 0.5),
        ];
        assert!(controller.poison_links(&updates, None).is_err());

        // The known link was left untouched.
        let snapshot = controller.snapshot();
        let link = snapshot
            .links
            .iter()
            .find(|l| l.id == LinkId::new("A", "R1"))
            .expect("link exists");
        assert!(link.error_rate < 0.11);
    }

    #[test]
    fn test_random_poison_hits_both_directions() {
        let controller = controller();
        let outcome = controller
            .random_poison(2, AttackKind::InterceptResend)
            .expect("edges exist");
        assert_eq!(outcome.updates.len(), 4);

        let snapshot = controller.snapshot();
        let tapped: Vec<&NetworkLink> = snapshot
            .links
            .iter()
            .filter(|l| l.attack == Some(AttackKind::InterceptResend))
            .collect();
        assert_eq!(tapped.len(), 4);
        for link in tapped {
            assert!((0.21..0.29).contains(&link.error_rate));
            assert!(link.compromised);
            let reverse = snapshot
                .links
                .iter()
                .find(|l| l.id == link.id.reversed())
                .expect("reverse link exists");
            assert_eq!(reverse.error_rate, link.error_rate);
        }
    }

    #[test]
    fn test_stealthy_attacks_stay_below_warning() {
        let controller = controller();
        let link = LinkId::new("A", "R1");
        for kind in [AttackKind::PhotonNumberSplitting, AttackKind::TrojanHorse] {
            let outcome = controller.inject_attack(&link, kind).expect("known link");
            assert!(outcome.rate_after < 0.11, "{kind} must stay stealthy");
            assert!(!outcome.compromised);
            assert!(outcome.alert.is_none());
        }
        let detectable = controller
            .inject_attack(&link, AttackKind::InterceptResend)
            .expect("known link");
        assert!(detectable.alert.is_some());
        assert!(detectable.compromised);
    }

    #[test]
    fn test_noise_injection_accumulates() {
        let controller = controller();
        let link = LinkId::new("R1", "R3");
        let first = controller
            .inject_attack(&link, AttackKind::NoiseInjection)
            .expect("known link");
        let second = controller
            .inject_attack(&link, AttackKind::NoiseInjection)
            .expect("known link");
        assert!(second.rate_after > first.rate_after);
        assert!(second.rate_after <= 1.0);
    }

    #[test]
    fn test_clear_restores_baseline_but_keeps_alerts() {
        let controller = controller();
        let updates = vec![
            (LinkId::new("A", "R1"), 0.5),
            (LinkId::new("A", "R2"), 0.5),
        ];
        controller
            .poison_links(&updates, Some(AttackKind::NoiseInjection))
            .expect("known links");
        assert_eq!(controller.alerts().len(), 2);

        controller.clear_all_attacks();
        let snapshot = controller.snapshot();
        assert!(snapshot.links.iter().all(|l| l.error_rate == 0.02));
        assert!(snapshot.links.iter().all(|l| !l.compromised));
        assert!(snapshot.links.iter().all(|l| l.attack.is_none()));
        assert!(snapshot.nodes.iter().all(|n| !n.compromised));
        assert!(controller.current_route().is_some());
        assert!(controller.can_route_safely());
        assert_eq!(controller.alerts().len(), 2);

        controller.reset();
        assert!(controller.alerts().is_empty());
        assert!(controller.current_route().is_some());
    }

    #[test]
    fn test_disabled_smart_routing_reports_no_reroute() {
        let config = RoutingConfig {
            smart_routing: false,
            ..RoutingConfig::default()
        };
        let controller =
            RoutingController::with_default_mesh(config, StdRng::seed_from_u64(11)).expect("valid");
        let hop = first_hop(&controller);
        let before = controller.current_route().expect("route exists");

        let outcome = controller
            .update_link_error_rate(&hop, 0.5, Some(AttackKind::NoiseInjection))
            .expect("known link");

        // Compromise marking still happens; the route does not move.
        assert!(outcome.compromised);
        let alert = outcome.alert.expect("alert still raised");
        assert_eq!(alert.action, RouteAction::RoutingDisabled);
        assert!(outcome.route_change.is_none());
        assert_eq!(controller.current_route(), Some(before));
    }

    #[test]
    fn test_toggling_smart_routing_recomputes() {
        let config = RoutingConfig {
            smart_routing: false,
            ..RoutingConfig::default()
        };
        let controller =
            RoutingController::with_default_mesh(config, StdRng::seed_from_u64(13)).expect("valid");
        let hop = first_hop(&controller);
        controller
            .update_link_error_rate(&hop, 0.5, None)
            .expect("known link");
        let stale = controller.current_route().expect("route exists");
        assert!(stale.windows(2).any(|w| w[0] == hop.src && w[1] == hop.dst));

        controller.set_smart_routing(true);
        assert!(controller.smart_routing());
        let rerouted = controller.current_route().expect("alternate exists");
        assert!(!rerouted.windows(2).any(|w| w[0] == hop.src && w[1] == hop.dst));
    }

    #[test]
    fn test_network_health_counts() {
        let controller = controller();
        let clean = controller.network_health();
        assert_eq!(clean.node_count, 6);
        assert_eq!(clean.link_count, 16);
        assert_eq!(clean.active_links, 16);
        assert_eq!(clean.compromised_links, 0);
        assert!(clean.safe_path_available);
        assert!((clean.average_error_rate - 0.02).abs() < 1e-9);

        controller
            .update_link_error_rate(&LinkId::new("A", "R1"), 0.5, None)
            .expect("known link");
        let poisoned = controller.network_health();
        assert_eq!(poisoned.compromised_links, 1);
        assert_eq!(poisoned.compromised_nodes, 1);
        assert_eq!(poisoned.alert_count, 1);
        assert!(poisoned.average_error_rate > clean.average_error_rate);
    }
}
