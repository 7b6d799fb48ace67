//! # Core Domain Entities
//!
//! Defines the entities every subsystem speaks in.
//!
//! ## Clusters
//!
//! - **Identity**: `NodeId`, `LinkId`, `PairId`, `SessionId`, `KeyId`
//! - **Network**: `NetworkNode`, `NetworkLink`, `RouteAlert`
//! - **Keys**: `KeyStatus`, `KeyInfo`
//! - **Sessions**: `SessionResult`, `PhotonProgress`

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

/// Unique identifier for a node in the network (e.g. `"A"`, `"R3"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A directed edge identifier. The link `A->B` is distinct from `B->A`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId {
    /// Transmitting endpoint.
    pub src: NodeId,
    /// Receiving endpoint.
    pub dst: NodeId,
}

impl LinkId {
    /// Create a link id between two nodes.
    pub fn new(src: impl Into<NodeId>, dst: impl Into<NodeId>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
        }
    }

    /// The same physical edge traversed in the opposite direction.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            src: self.dst.clone(),
            dst: self.src.clone(),
        }
    }
}

impl From<(&str, &str)> for LinkId {
    fn from((src, dst): (&str, &str)) -> Self {
        Self::new(src, dst)
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.src, self.dst)
    }
}

/// A communicating pair, addressed from initiator to responder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PairId {
    /// The party that initiates key generation.
    pub initiator: NodeId,
    /// The party the key is shared with.
    pub responder: NodeId,
}

impl PairId {
    /// Create a pair id.
    pub fn new(initiator: impl Into<NodeId>, responder: impl Into<NodeId>) -> Self {
        Self {
            initiator: initiator.into(),
            responder: responder.into(),
        }
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.initiator, self.responder)
    }
}

/// Unique identifier for one protocol session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Generate a fresh session id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// Unique identifier for a stored key, rendered as `qkd-<12 hex chars>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyId(pub String);

impl KeyId {
    /// Generate a fresh key id.
    #[must_use]
    pub fn generate() -> Self {
        let hex = Uuid::new_v4().simple().to_string();
        Self(format!("qkd-{}", &hex[..12]))
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// CLUSTER B: NETWORK
// =============================================================================

/// Display role of a node in the topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeRole {
    /// Originates key generation sessions.
    Source,
    /// Terminates key generation sessions.
    Sink,
    /// Forwards traffic between endpoints.
    Relay,
    /// A node under adversarial control.
    Adversary,
}

/// A node in the monitored network.
///
/// Mutated only by the routing controller in response to link events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    /// Stable identity.
    pub id: NodeId,
    /// Display role.
    pub role: NodeRole,
    /// Layout-only position; carries no routing meaning.
    pub position: (f64, f64),
    /// Whether the node participates in routing.
    pub active: bool,
    /// Whether the node sits behind a critically noisy link.
    pub compromised: bool,
}

impl NetworkNode {
    /// Create an active, uncompromised node.
    pub fn new(id: impl Into<NodeId>, role: NodeRole, position: (f64, f64)) -> Self {
        Self {
            id: id.into(),
            role,
            position,
            active: true,
            compromised: false,
        }
    }
}

/// Known eavesdropping attack kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    /// Measure in a random basis and re-emit; detectable via QBER.
    InterceptResend,
    /// Split multi-photon pulses; stealthy, zero QBER impact.
    PhotonNumberSplitting,
    /// Probe the sender apparatus to learn bases; stealthy.
    TrojanHorse,
    /// Raw link-level noise injection; not a per-qubit strategy.
    NoiseInjection,
}

impl AttackKind {
    /// Canonical lowercase label, also accepted by [`FromStr`].
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::InterceptResend => "intercept_resend",
            Self::PhotonNumberSplitting => "photon_number_splitting",
            Self::TrojanHorse => "trojan_horse",
            Self::NoiseInjection => "noise_injection",
        }
    }
}

impl fmt::Display for AttackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for attack labels that name no known attack kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown attack kind: {0}")]
pub struct UnknownAttackKind(pub String);

impl FromStr for AttackKind {
    type Err = UnknownAttackKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "intercept_resend" => Ok(Self::InterceptResend),
            "photon_number_splitting" => Ok(Self::PhotonNumberSplitting),
            "trojan_horse" => Ok(Self::TrojanHorse),
            "noise_injection" => Ok(Self::NoiseInjection),
            other => Err(UnknownAttackKind(other.to_owned())),
        }
    }
}

/// A directed link between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkLink {
    /// Directed edge identity.
    pub id: LinkId,
    /// Last measured quantum bit error rate, clamped to `[0, 1]`.
    pub error_rate: f64,
    /// One-way latency in milliseconds.
    pub latency_ms: f64,
    /// Whether the link is physically up.
    pub active: bool,
    /// Whether the error rate has crossed the critical threshold and not
    /// yet recovered below the warning threshold.
    pub compromised: bool,
    /// Attack label, if one was named when the rate was last raised.
    pub attack: Option<AttackKind>,
}

impl NetworkLink {
    /// Create an active, clean link with the given baseline error rate.
    pub fn new(id: LinkId, error_rate: f64, latency_ms: f64) -> Self {
        Self {
            id,
            error_rate,
            latency_ms,
            active: true,
            compromised: false,
            attack: None,
        }
    }
}

/// Which alert threshold a rate update crossed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertThreshold {
    /// The error rate entered the suspicious band.
    Warning,
    /// The error rate reached the compromise band.
    Critical,
}

/// The routing action recorded in an alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteAction {
    /// Traffic was moved onto the given node path.
    Rerouted(Vec<NodeId>),
    /// No path avoiding the noisy link exists.
    NoAlternatePath,
    /// Risk-aware routing is disabled; the route was left alone.
    RoutingDisabled,
}

impl fmt::Display for RouteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rerouted(path) => {
                let hops: Vec<&str> = path.iter().map(NodeId::as_str).collect();
                write!(f, "rerouted via {}", hops.join("->"))
            }
            Self::NoAlternatePath => f.write_str("no alternate path"),
            Self::RoutingDisabled => f.write_str("no reroute (smart routing disabled)"),
        }
    }
}

/// One entry in the append-only alert log.
///
/// Created only on an upward threshold crossing; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAlert {
    /// Wall-clock creation time, milliseconds since the epoch.
    pub at_ms: u64,
    /// The link whose rate crossed a threshold.
    pub link: LinkId,
    /// Error rate before the update.
    pub rate_before: f64,
    /// Error rate after the update.
    pub rate_after: f64,
    /// The highest threshold the new rate sits above.
    pub threshold: AlertThreshold,
    /// What the controller did about it.
    pub action: RouteAction,
    /// Attack label, if one was named in the triggering update.
    pub attack: Option<AttackKind>,
}

// =============================================================================
// CLUSTER C: KEYS
// =============================================================================

/// Lifecycle status of a stored key.
///
/// Transitions are one-directional: `Active -> Used` or
/// `Active -> Compromised`. A key is never resurrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyStatus {
    /// Stored and available for exactly one consumption.
    Active,
    /// Consumed; retained for audit only.
    Used,
    /// Invalidated after its link's error rate crossed the threshold.
    Compromised,
}

impl KeyStatus {
    /// Whether the key can still be consumed.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Used => "used",
            Self::Compromised => "compromised",
        };
        f.write_str(s)
    }
}

/// Public projection of a stored key. Carries the digest, never the bits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// Stable key identity.
    pub id: KeyId,
    /// The pair the key belongs to.
    pub pair: PairId,
    /// Key length in bits.
    pub length: usize,
    /// Current lifecycle status.
    pub status: KeyStatus,
    /// QBER measured by the session that produced the key.
    pub qber: f64,
    /// Creation time, milliseconds since the epoch.
    pub created_at_ms: u64,
    /// Hex-encoded SHA-256 digest of the key material.
    pub digest_hex: String,
}

// =============================================================================
// CLUSTER D: SESSIONS
// =============================================================================

/// Per-photon progress projection published while a session steps.
///
/// Deliberately excludes bits and bases so mid-session subscribers learn
/// nothing about the key under construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotonProgress {
    /// Zero-based photon index within the session.
    pub index: usize,
    /// Whether the photon survived the channel.
    pub delivered: bool,
    /// Whether sender and receiver chose the same basis.
    pub bases_matched: bool,
}

/// Aggregate outcome of one completed protocol session.
///
/// Immutable once created; owned by whichever caller ran the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Number of photons the caller asked for.
    pub requested_len: usize,
    /// Photons actually transmitted.
    pub raw_count: usize,
    /// Photons lost in the channel.
    pub lost_count: usize,
    /// Sender-side sifted bits.
    pub sifted_sender: Vec<bool>,
    /// Receiver-side sifted bits.
    pub sifted_receiver: Vec<bool>,
    /// Fraction of sifted positions where the parties disagree.
    pub qber: f64,
    /// Whether the QBER exceeded the abort threshold.
    pub detected: bool,
    /// Privacy-amplified final key; empty when detected or nothing sifted.
    pub final_key: Vec<bool>,
    /// Rolling QBER samples taken while the session stepped.
    pub qber_history: Vec<f64>,
}

impl SessionResult {
    /// Number of sifted bits.
    #[must_use]
    pub fn sifted_len(&self) -> usize {
        self.sifted_sender.len()
    }

    /// Whether the session produced key material worth storing.
    #[must_use]
    pub fn has_usable_key(&self) -> bool {
        !self.detected && !self.final_key.is_empty()
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_id_display_and_reverse() {
        let link = LinkId::new("A", "R1");
        assert_eq!(link.to_string(), "A->R1");
        assert_eq!(link.reversed().to_string(), "R1->A");
        assert_eq!(link.reversed().reversed(), link);
    }

    #[test]
    fn test_key_id_format() {
        let id = KeyId::generate();
        assert!(id.as_str().starts_with("qkd-"));
        assert_eq!(id.as_str().len(), "qkd-".len() + 12);
    }

    #[test]
    fn test_attack_kind_round_trip() {
        for kind in [
            AttackKind::InterceptResend,
            AttackKind::PhotonNumberSplitting,
            AttackKind::TrojanHorse,
            AttackKind::NoiseInjection,
        ] {
            assert_eq!(kind.label().parse::<AttackKind>(), Ok(kind));
        }
        assert!("quantum_hammer".parse::<AttackKind>().is_err());
    }

    #[test]
    fn test_route_action_display() {
        let action = RouteAction::Rerouted(vec!["A".into(), "R2".into(), "B".into()]);
        assert_eq!(action.to_string(), "rerouted via A->R2->B");
        assert_eq!(RouteAction::NoAlternatePath.to_string(), "no alternate path");
    }

    #[test]
    fn test_status_transitions_active_only() {
        assert!(KeyStatus::Active.is_active());
        assert!(!KeyStatus::Used.is_active());
        assert!(!KeyStatus::Compromised.is_active());
    }
}
