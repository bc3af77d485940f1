//! Acquisition supervisor
//!
//! Drives a [`ReadingSource`] through its connection lifecycle:
//! `Disconnected → Connecting → Connected → (error) → Disconnected`, with
//! reconnection per the configured policy. Every state change is published
//! on the watch channel (for the simulation gate) and enqueued as a status
//! event (for the consumer). Successful connects are recorded in the
//! known-devices registry.

use crate::acquisition::ReadingSource;
use crate::config::BluetoothConfig;
use crate::store::KnownDevices;
use crate::types::{LinkState, MonitorEvent};
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub struct SourceSupervisor<S: ReadingSource> {
    source: S,
    policy: BluetoothConfig,
    /// Seconds between polls while connected
    update_interval: u64,
    events: mpsc::Sender<MonitorEvent>,
    link_state: watch::Sender<LinkState>,
    registry: Option<KnownDevices>,
    cancel: CancellationToken,
}

impl<S: ReadingSource> SourceSupervisor<S> {
    pub fn new(
        source: S,
        policy: BluetoothConfig,
        update_interval: u64,
        events: mpsc::Sender<MonitorEvent>,
        link_state: watch::Sender<LinkState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            policy,
            update_interval,
            events,
            link_state,
            registry: None,
            cancel,
        }
    }

    /// Record successful connections in this registry.
    pub fn with_registry(mut self, registry: KnownDevices) -> Self {
        self.registry = Some(registry);
        self
    }

    async fn publish(&self, state: LinkState, message: String) {
        let _ = self.link_state.send(state);
        let _ = self
            .events
            .send(MonitorEvent::ConnectionStatus { state, message })
            .await;
    }

    /// Run until cancelled or reconnection policy gives up.
    pub async fn run(mut self) {
        let source_name = self.source.source_name();
        info!(source = source_name, "Acquisition supervisor started");

        loop {
            self.publish(
                LinkState::Connecting,
                format!("Connecting to {}", self.source.endpoint()),
            )
            .await;

            match self.source.connect().await {
                Ok(()) => {
                    self.publish(
                        LinkState::Connected,
                        format!("Connected to {}", self.source.endpoint()),
                    )
                    .await;
                    self.record_device();
                    self.poll_until_lost().await;
                }
                Err(e) => {
                    warn!(source = source_name, error = %e, "Connection attempt failed");
                    self.publish(LinkState::Disconnected, format!("Connection failed: {e}"))
                        .await;
                }
            }

            if self.cancel.is_cancelled() {
                break;
            }
            if !self.policy.auto_reconnect {
                info!(source = source_name, "Auto-reconnect disabled, supervisor stopping");
                break;
            }

            let backoff = tokio::time::Duration::from_secs(self.policy.reconnect_interval);
            info!(
                source = source_name,
                delay_secs = self.policy.reconnect_interval,
                "Waiting before reconnect"
            );
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        self.source.disconnect().await;
        let _ = self.link_state.send(LinkState::Disconnected);
        info!(source = source_name, "Acquisition supervisor stopped");
    }

    /// Poll on the configured cadence until a transport error or cancel.
    ///
    /// Non-transport errors (malformed frame, bad scalar) drop the tick and
    /// keep the connection.
    async fn poll_until_lost(&mut self) {
        let mut ticker =
            tokio::time::interval(tokio::time::Duration::from_secs(self.update_interval.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return,
                _ = ticker.tick() => {}
            }

            match self.source.poll_reading().await {
                Ok(reading) => {
                    let _ = self.events.send(MonitorEvent::Reading(reading)).await;
                }
                Err(e) if e.is_transport() => {
                    warn!(source = self.source.source_name(), error = %e, "Connection lost");
                    self.source.disconnect().await;
                    self.publish(LinkState::Disconnected, format!("Connection lost: {e}"))
                        .await;
                    return;
                }
                Err(e) => {
                    // Tick dropped, connection intact
                    warn!(source = self.source.source_name(), error = %e, "Tick dropped");
                }
            }
        }
    }

    fn record_device(&self) {
        if let Some(ref registry) = self.registry {
            if let Err(e) = registry.record_connection(&self.source.endpoint(), Utc::now()) {
                warn!(error = %e, "Failed to record device in registry");
            }
        }
    }
}
