//! Simulation worker
//!
//! Runs the synthetic generator on the monitoring cadence whenever no live
//! source is connected. The gate is the link-state watch channel: while the
//! supervisor reports `Connected` the worker skips its tick, so the latest
//! reading only ever has one producer.

use crate::sim::SyntheticGenerator;
use crate::types::{InsoleReading, LinkState, MonitorEvent};
use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct SimulationWorker {
    generator: SyntheticGenerator,
    /// Seconds between generated readings
    update_interval: u64,
    events: mpsc::Sender<MonitorEvent>,
    link_state: watch::Receiver<LinkState>,
    cancel: CancellationToken,
    previous: Option<InsoleReading>,
}

impl SimulationWorker {
    pub fn new(
        generator: SyntheticGenerator,
        update_interval: u64,
        events: mpsc::Sender<MonitorEvent>,
        link_state: watch::Receiver<LinkState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            generator,
            update_interval,
            events,
            link_state,
            cancel,
            previous: None,
        }
    }

    pub async fn run(mut self) {
        info!(
            interval_secs = self.update_interval,
            "Simulation worker started"
        );
        let mut ticker =
            tokio::time::interval(tokio::time::Duration::from_secs(self.update_interval.max(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            // Live source wins; drop continuity so the next synthetic run
            // starts fresh instead of stepping from a stale value.
            if *self.link_state.borrow() == LinkState::Connected {
                self.previous = None;
                continue;
            }

            let reading = self.generator.next_reading(self.previous.as_ref(), Utc::now());
            self.previous = Some(reading.clone());
            if self.events.send(MonitorEvent::Reading(reading)).await.is_err() {
                break;
            }
        }
        info!("Simulation worker stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MonitoringConfig, SimulationConfig};

    fn worker(
        events: mpsc::Sender<MonitorEvent>,
        link_state: watch::Receiver<LinkState>,
        cancel: CancellationToken,
    ) -> SimulationWorker {
        let sim = SimulationConfig {
            enabled: true,
            realistic_variation: true,
        };
        let generator = SyntheticGenerator::seeded(99, &sim, &MonitoringConfig::default());
        SimulationWorker::new(generator, 1, events, link_state, cancel)
    }

    #[tokio::test(start_paused = true)]
    async fn generates_while_disconnected() {
        let (events_tx, mut events_rx) = mpsc::channel(16);
        let (_state_tx, state_rx) = watch::channel(LinkState::Disconnected);
        let cancel = CancellationToken::new();
        tokio::spawn(worker(events_tx, state_rx, cancel.clone()).run());

        for _ in 0..3 {
            let event = events_rx.recv().await.unwrap();
            assert!(matches!(event, MonitorEvent::Reading(_)));
        }
        cancel.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn stays_quiet_while_connected() {
        let (events_tx, mut events_rx) = mpsc::channel(16);
        let (state_tx, state_rx) = watch::channel(LinkState::Connected);
        let cancel = CancellationToken::new();
        tokio::spawn(worker(events_tx, state_rx, cancel.clone()).run());

        // Let several ticks elapse under the paused clock
        tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
        assert!(events_rx.try_recv().is_err());

        // Link drops; generation resumes
        state_tx.send(LinkState::Disconnected).unwrap();
        let event = events_rx.recv().await.unwrap();
        assert!(matches!(event, MonitorEvent::Reading(_)));
        cancel.cancel();
    }
}
