//! # Network Events
//!
//! Defines all event types that flow through the shared bus. These are the
//! outward-facing surface of the core; UI, transport, and demo layers
//! subscribe here and are never called directly.

use serde::{Deserialize, Serialize};
use shared_types::{
    KeyInfo, LinkId, NodeId, PairId, PhotonProgress, RouteAlert, SessionId, SessionResult,
};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NetworkEvent {
    // =========================================================================
    // SUBSYSTEM 1: PROTOCOL ENGINE
    // =========================================================================
    /// One photon finished its transit through the channel.
    ///
    /// Published per step while a session runs; carries a reduced
    /// projection so subscribers learn nothing about the key bits.
    PhotonProcessed {
        /// The session the photon belongs to.
        session: SessionId,
        /// What happened to the photon.
        progress: PhotonProgress,
    },

    /// A session ran to completion and was summarized.
    SessionComplete {
        /// The completed session.
        session: SessionId,
        /// Full aggregate outcome, including the detection flag.
        result: SessionResult,
    },

    // =========================================================================
    // SUBSYSTEM 2: ROUTING CONTROLLER
    // =========================================================================
    /// A link's measured error rate changed.
    LinkUpdated {
        /// The updated link.
        link: LinkId,
        /// The clamped error rate now recorded on the link.
        error_rate: f64,
        /// Whether the link is currently marked compromised.
        compromised: bool,
    },

    /// An upward threshold crossing produced an alert.
    ///
    /// By the time subscribers see this, the route already reflects
    /// whatever action the alert records.
    AlertRaised(RouteAlert),

    /// The preferred path between two endpoints changed.
    RouteChanged {
        /// Path source.
        src: NodeId,
        /// Path sink.
        dst: NodeId,
        /// The new path, source first; empty when unreachable.
        path: Vec<NodeId>,
    },

    /// A node was marked compromised because a critically noisy link
    /// terminates at it.
    NodeCompromised(NodeId),

    // =========================================================================
    // SUBSYSTEM 3: KEYSTORE
    // =========================================================================
    /// A key generation attempt finished.
    ///
    /// `key` is `None` when the session detected an eavesdropper or
    /// produced no usable material.
    KeyGenerated {
        /// The pair the attempt ran for.
        pair: PairId,
        /// The session outcome that backed the attempt.
        result: SessionResult,
        /// The stored key's public projection, if one was stored.
        key: Option<KeyInfo>,
    },
}

impl NetworkEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::PhotonProcessed { .. } | Self::SessionComplete { .. } => EventTopic::Protocol,
            Self::LinkUpdated { .. }
            | Self::AlertRaised(_)
            | Self::RouteChanged { .. }
            | Self::NodeCompromised(_) => EventTopic::Routing,
            Self::KeyGenerated { .. } => EventTopic::Keystore,
        }
    }

    /// Get the originating subsystem ID.
    #[must_use]
    pub fn source_subsystem(&self) -> u8 {
        match self.topic() {
            EventTopic::Protocol => 1,
            EventTopic::Routing => 2,
            EventTopic::Keystore => 3,
            EventTopic::All => 0,
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    /// Subsystem 1 events (sessions and photons).
    Protocol,
    /// Subsystem 2 events (links, routes, alerts).
    Routing,
    /// Subsystem 3 events (key lifecycle).
    Keystore,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Source subsystems to include. Empty means all sources.
    pub source_subsystems: Vec<u8>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            source_subsystems: Vec::new(),
        }
    }

    /// Create a filter for events from specific subsystems.
    #[must_use]
    pub fn from_subsystems(subsystems: Vec<u8>) -> Self {
        Self {
            topics: Vec::new(),
            source_subsystems: subsystems,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &NetworkEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let source_match = self.source_subsystems.is_empty()
            || self.source_subsystems.contains(&event.source_subsystem());

        topic_match && source_match
    }
}
