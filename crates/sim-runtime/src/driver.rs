//! Simulation driver wiring the three subsystems over the event bus.
//!
//! One driver owns the routing controller, the key manager, and the bus.
//! A round runs a full protocol session across the current preferred
//! route, publishes per-photon progress, stores or discards the produced
//! key, then feeds the measured error rate back onto every traversed
//! link so routing and key invalidation react to what the protocol
//! actually observed.

use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{info, warn};

use qkd_01_protocol::{Bb84Session, EveConfig, NoiseModel, SessionConfig};
use qkd_02_routing::{
    LinkUpdateOutcome, NetworkHealth, PoisonOutcome, RouteChange, RoutingController, TopologySpec,
};
use qkd_03_keystore::KeyManager;
use shared_bus::{EventPublisher, InMemoryEventBus, NetworkEvent};
use shared_types::{AttackKind, KeyId, LinkId, NodeId, PairId, SessionId};

use crate::config::RuntimeConfig;

/// Extra depolarization a session suffers while its route carries a
/// noise-injection attack.
const INJECTED_DEPOLARIZATION: f64 = 0.12;

/// Bus capacity. One session bursts a thousand photon events before a
/// logger catches up, so the channel holds several sessions' worth.
const BUS_CAPACITY: usize = 4096;

/// What one round did.
#[derive(Debug, Clone)]
pub struct RoundSummary {
    /// The session the round ran.
    pub session: SessionId,
    /// Route the session crossed. Empty when no route existed and
    /// nothing ran.
    pub path: Vec<NodeId>,
    /// Measured quantum bit error rate.
    pub qber: f64,
    /// Whether the session aborted on suspected eavesdropping.
    pub detected: bool,
    /// Id of the stored key, if material survived.
    pub stored_key: Option<KeyId>,
    /// Keys invalidated by alerts this round.
    pub invalidated: usize,
    /// Whether the preferred route moved.
    pub rerouted: bool,
    /// Whether an empty pool triggered a replacement generation that
    /// stored a key.
    pub refreshed: bool,
}

/// Owns the subsystems and runs rounds against them.
pub struct SimulationDriver {
    config: RuntimeConfig,
    pair: PairId,
    bus: Arc<InMemoryEventBus>,
    router: Arc<RoutingController>,
    keys: Arc<KeyManager>,
    rng: Mutex<StdRng>,
}

impl SimulationDriver {
    /// Wire the subsystems from one configuration.
    pub fn new(config: RuntimeConfig) -> anyhow::Result<Self> {
        let mut master = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let topology_rng = StdRng::seed_from_u64(master.gen());

        let router = RoutingController::new(
            config.routing.clone(),
            TopologySpec::default_mesh(),
            topology_rng,
        )
        .context("routing controller rejected its configuration")?;
        let keys = KeyManager::new(config.keystore.clone())
            .context("keystore rejected its configuration")?;

        let pair = config.pair();
        info!(pair = %pair, seed = ?config.seed, "simulation driver wired");

        Ok(Self {
            config,
            pair,
            bus: Arc::new(InMemoryEventBus::with_capacity(BUS_CAPACITY)),
            router: Arc::new(router),
            keys: Arc::new(keys),
            rng: Mutex::new(master),
        })
    }

    /// The bus subscribers attach to.
    #[must_use]
    pub fn bus(&self) -> Arc<InMemoryEventBus> {
        Arc::clone(&self.bus)
    }

    /// The routing controller.
    #[must_use]
    pub fn router(&self) -> Arc<RoutingController> {
        Arc::clone(&self.router)
    }

    /// The key manager.
    #[must_use]
    pub fn keys(&self) -> Arc<KeyManager> {
        Arc::clone(&self.keys)
    }

    /// The endpoint pair the driver generates keys for.
    #[must_use]
    pub fn pair(&self) -> &PairId {
        &self.pair
    }

    /// Aggregate health counters.
    #[must_use]
    pub fn health(&self) -> NetworkHealth {
        self.router.network_health()
    }

    /// Run one full generation round.
    ///
    /// Returns a summary with an empty `path` when no route currently
    /// exists; nothing runs in that case.
    pub async fn run_round(&self) -> anyhow::Result<RoundSummary> {
        let session = SessionId::generate();
        let Some(path) = self.router.current_route() else {
            warn!(pair = %self.pair, "no route between endpoints, session skipped");
            return Ok(RoundSummary {
                session,
                path: Vec::new(),
                qber: 0.0,
                detected: false,
                stored_key: None,
                invalidated: 0,
                rerouted: false,
                refreshed: false,
            });
        };

        let hops = hop_links(&path);
        let route_attack = self.route_attack(&hops);
        let (noise, eve) = self.session_profile(route_attack);
        let session_rng = StdRng::seed_from_u64(self.rng.lock().gen());

        info!(session = %session, path = ?path, attack = ?route_attack, "session starting");

        let session_config = SessionConfig {
            key_length: self.config.photons_per_session,
            noise,
            eve,
        };
        let mut engine = Bb84Session::new(session_config, session_rng)
            .context("session configuration rejected")?
            .prepare();
        while let Some(progress) = engine.step() {
            self.bus
                .publish(NetworkEvent::PhotonProcessed { session, progress })
                .await;
        }
        let result = engine.finish().into_result();
        self.bus
            .publish(NetworkEvent::SessionComplete {
                session,
                result: result.clone(),
            })
            .await;

        let stored = self.keys.store_session(&self.pair, &result);
        self.bus
            .publish(NetworkEvent::KeyGenerated {
                pair: self.pair.clone(),
                result: result.clone(),
                key: stored.clone(),
            })
            .await;

        // A photon-splitting adversary measures her held-back photons
        // after basis reveal, so a key stored under PNS is also hers.
        if route_attack == Some(AttackKind::PhotonNumberSplitting) {
            if let Some(key) = &stored {
                self.keys
                    .record_stolen(&key.id, AttackKind::PhotonNumberSplitting)?;
            }
        }

        let updates: Vec<(LinkId, f64)> = hops
            .iter()
            .map(|link| (link.clone(), result.qber))
            .collect();
        let outcome = self.router.poison_links(&updates, route_attack)?;
        let rerouted = outcome.route_change.is_some();
        let invalidated = self
            .publish_link_events(&outcome.updates, outcome.route_change.as_ref())
            .await;

        let refreshed = if self.keys.needs_refresh(&self.pair) {
            self.refresh_key().await?
        } else {
            false
        };

        Ok(RoundSummary {
            session,
            path,
            qber: result.qber,
            detected: result.detected,
            stored_key: stored.map(|key| key.id),
            invalidated,
            rerouted,
            refreshed,
        })
    }

    /// Land a named attack on the first hop of the current route.
    ///
    /// Returns `None` when no route exists to attack.
    pub async fn attack_route(
        &self,
        kind: AttackKind,
    ) -> anyhow::Result<Option<LinkUpdateOutcome>> {
        let Some(path) = self.router.current_route() else {
            warn!(attack = %kind, "no route to attack");
            return Ok(None);
        };
        let hops = hop_links(&path);
        let Some(first) = hops.first() else {
            return Ok(None);
        };
        warn!(link = %first, attack = %kind, "attack landed on the active route");
        let update = self.router.inject_attack(first, kind)?;
        self.publish_link_events(std::slice::from_ref(&update), update.route_change.as_ref())
            .await;
        Ok(Some(update))
    }

    /// Land a named attack on `edges` randomly chosen undirected edges.
    pub async fn random_attack(
        &self,
        edges: usize,
        kind: AttackKind,
    ) -> anyhow::Result<PoisonOutcome> {
        let outcome = self.router.random_poison(edges, kind)?;
        self.publish_link_events(&outcome.updates, outcome.route_change.as_ref())
            .await;
        Ok(outcome)
    }

    /// Restore every link to baseline and publish the resulting route.
    pub async fn clear_attacks(&self) {
        if let Some(change) = self.router.clear_all_attacks() {
            self.publish_route_change(&change).await;
        }
    }

    /// Rebuild the topology and wipe all stored keys.
    pub async fn reset(&self) {
        if let Some(change) = self.router.reset() {
            self.publish_route_change(&change).await;
        }
        self.keys.clear();
    }

    /// Run one replacement generation after invalidation emptied the
    /// pool, over whatever route currently exists.
    async fn refresh_key(&self) -> anyhow::Result<bool> {
        let Some(path) = self.router.current_route() else {
            warn!(pair = %self.pair, "pool empty but no route for a refresh");
            return Ok(false);
        };
        let route_attack = self.route_attack(&hop_links(&path));
        let (noise, eve) = self.session_profile(route_attack);
        let rng = StdRng::seed_from_u64(self.rng.lock().gen());
        let session_config = SessionConfig {
            key_length: self.config.photons_per_session,
            noise,
            eve,
        };
        let (result, stored) = self.keys.generate(&self.pair, session_config, rng)?;
        self.bus
            .publish(NetworkEvent::KeyGenerated {
                pair: self.pair.clone(),
                result,
                key: stored.clone(),
            })
            .await;
        Ok(stored.is_some())
    }

    /// First attack label found along the route, if any.
    fn route_attack(&self, hops: &[LinkId]) -> Option<AttackKind> {
        let snapshot = self.router.snapshot();
        hops.iter().find_map(|id| {
            snapshot
                .links
                .iter()
                .find(|link| &link.id == id)
                .and_then(|link| link.attack)
        })
    }

    /// Channel noise and eavesdropper a session sees, given the attack
    /// present on its route.
    fn session_profile(&self, attack: Option<AttackKind>) -> (NoiseModel, Option<EveConfig>) {
        let mut noise = self.config.noise;
        let eve = match attack {
            Some(AttackKind::InterceptResend) => Some(EveConfig::intercept_resend(1.0)),
            Some(AttackKind::PhotonNumberSplitting) => Some(EveConfig::photon_number_splitting()),
            Some(AttackKind::TrojanHorse) => Some(EveConfig::trojan_horse()),
            Some(AttackKind::NoiseInjection) => {
                noise.depolarization += INJECTED_DEPOLARIZATION;
                None
            }
            None => None,
        };
        (noise, eve)
    }

    /// Publish a batch routing outcome, then hand every alert to the
    /// keystore. Returns how many keys the alerts invalidated.
    ///
    /// Order matches what subscribers assume: link states first, then
    /// node compromises, then the route, then alerts describing it.
    async fn publish_link_events(
        &self,
        updates: &[LinkUpdateOutcome],
        route_change: Option<&RouteChange>,
    ) -> usize {
        for update in updates {
            self.bus
                .publish(NetworkEvent::LinkUpdated {
                    link: update.link.clone(),
                    error_rate: update.rate_after,
                    compromised: update.compromised,
                })
                .await;
        }
        for update in updates {
            if let Some(node) = &update.compromised_node {
                self.bus
                    .publish(NetworkEvent::NodeCompromised(node.clone()))
                    .await;
            }
        }
        if let Some(change) = route_change {
            self.publish_route_change(change).await;
        }
        let mut invalidated = 0;
        for update in updates {
            if let Some(alert) = &update.alert {
                self.bus
                    .publish(NetworkEvent::AlertRaised(alert.clone()))
                    .await;
                invalidated += self.keys.handle_alert(alert).len();
            }
        }
        invalidated
    }

    async fn publish_route_change(&self, change: &RouteChange) {
        self.bus
            .publish(NetworkEvent::RouteChanged {
                src: change.src.clone(),
                dst: change.dst.clone(),
                path: change.path.clone(),
            })
            .await;
    }
}

/// Directed links a path traverses, in order.
fn hop_links(path: &[NodeId]) -> Vec<LinkId> {
    path.windows(2)
        .map(|pair| LinkId::new(pair[0].clone(), pair[1].clone()))
        .collect()
}
