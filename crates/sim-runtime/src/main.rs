//! # QKD-Mesh Simulation Runtime
//!
//! Entry point wiring the protocol engine, the routing controller, and
//! the keystore over the shared event bus, then driving generation
//! rounds against the default mesh.
//!
//! ## Startup sequence
//!
//! 1. Initialize logging
//! 2. Load configuration from `QKD_*` environment variables
//! 3. Wire the subsystems (bus, topology, controller, keystore)
//! 4. Start the event logger task
//! 5. Run generation rounds, landing the configured attack mid-run
//! 6. Report final health and shut down on completion or Ctrl+C

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use shared_bus::{EventFilter, NetworkEvent};
use sim_runtime::{RuntimeConfig, SimulationDriver};

/// The simulation runtime: one driver plus the shutdown plumbing.
struct SimRuntime {
    config: RuntimeConfig,
    driver: Arc<SimulationDriver>,
    /// Shutdown signal sender.
    shutdown_tx: tokio::sync::watch::Sender<bool>,
    /// Shutdown signal receiver.
    shutdown_rx: tokio::sync::watch::Receiver<bool>,
}

impl SimRuntime {
    fn new(config: RuntimeConfig) -> Result<Self> {
        let driver = Arc::new(SimulationDriver::new(config.clone())?);
        let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
        Ok(Self {
            config,
            driver,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Start the background task mirroring bus traffic into the log.
    fn start_event_logger(&self) {
        let mut subscription = self.driver.bus().subscribe(EventFilter::all());
        let mut shutdown = self.shutdown_rx.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    event = subscription.recv() => match event {
                        Some(event) => log_event(&event),
                        None => break,
                    },
                    _ = shutdown.changed() => {
                        info!("event logger stopped");
                        break;
                    }
                }
            }
        });
    }

    /// Run the configured number of rounds, landing the configured
    /// attack on the active route before `attack_round`.
    async fn run_rounds(&self) -> Result<()> {
        for round in 1..=self.config.rounds {
            if round == self.config.attack_round {
                if let Some(kind) = self.config.attack {
                    self.driver.attack_route(kind).await?;
                }
            }
            let summary = self.driver.run_round().await?;
            info!(
                round,
                session = %summary.session,
                qber = summary.qber,
                detected = summary.detected,
                stored = summary.stored_key.is_some(),
                invalidated = summary.invalidated,
                rerouted = summary.rerouted,
                refreshed = summary.refreshed,
                "round complete"
            );
            tokio::time::sleep(Duration::from_millis(self.config.round_delay_ms)).await;
        }
        Ok(())
    }

    /// Signal the logger task and give it time to drain.
    async fn shutdown(&self) {
        info!("initiating shutdown");
        if self.shutdown_tx.send(true).is_err() {
            warn!("no event logger listening for shutdown");
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
        info!("shutdown complete");
    }
}

/// Render one bus event at an appropriate level.
fn log_event(event: &NetworkEvent) {
    match event {
        NetworkEvent::PhotonProcessed { session, progress } => {
            debug!(
                session = %session,
                index = progress.index,
                delivered = progress.delivered,
                matched = progress.bases_matched,
                "photon processed"
            );
        }
        NetworkEvent::SessionComplete { session, result } => {
            info!(
                session = %session,
                qber = result.qber,
                detected = result.detected,
                sifted = result.sifted_len(),
                "session complete"
            );
        }
        NetworkEvent::LinkUpdated {
            link,
            error_rate,
            compromised,
        } => {
            debug!(link = %link, error_rate, compromised, "link updated");
        }
        NetworkEvent::AlertRaised(alert) => {
            warn!(
                link = %alert.link,
                rate = alert.rate_after,
                action = %alert.action,
                "route alert"
            );
        }
        NetworkEvent::RouteChanged { src, dst, path } => {
            if path.is_empty() {
                warn!(src = %src, dst = %dst, "no route available");
            } else {
                info!(src = %src, dst = %dst, path = ?path, "route changed");
            }
        }
        NetworkEvent::NodeCompromised(node) => {
            warn!(node = %node, "node compromised");
        }
        NetworkEvent::KeyGenerated { pair, result, key } => match key {
            Some(info) => info!(pair = %pair, key = %info.id, bits = info.length, "key stored"),
            None => warn!(pair = %pair, qber = result.qber, "generation yielded no key"),
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let config = RuntimeConfig::load_from_env();

    info!("===========================================");
    info!("  QKD-Mesh Simulation Runtime v0.1.0");
    info!("===========================================");
    info!(
        rounds = config.rounds,
        photons = config.photons_per_session,
        attack = ?config.attack,
        smart_routing = config.routing.smart_routing,
        "configuration loaded"
    );

    let runtime = SimRuntime::new(config)?;
    runtime.start_event_logger();

    tokio::select! {
        outcome = runtime.run_rounds() => outcome?,
        _ = tokio::signal::ctrl_c() => {
            info!("interrupt received");
        }
    }

    let health = serde_json::to_string(&runtime.driver.health())?;
    info!(health = %health, "final network health");
    info!(
        keys = runtime.driver.keys().total_keys(),
        alerts = runtime.driver.router().alerts().len(),
        "final simulation state"
    );

    runtime.shutdown().await;

    Ok(())
}
