//! Single-consumer event loop
//!
//! Owns all application state. Drains the bounded event queue on a 100 ms
//! tick, capped per tick so one scheduling slice never processes an
//! unbounded backlog, and runs the pattern detector on a slower cadence.
//! Persistence failures are logged and never stop the loop; the in-memory
//! latest reading is updated regardless.

use crate::analysis::patterns::{detect_patterns, AnalysisDepth};
use crate::analysis::threshold::check_reading;
use crate::config::AppConfig;
use crate::store::CsvLog;
use crate::types::{InsoleReading, LinkState, MonitorEvent};
use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::{CONSUMER_TICK_MS, MAX_EVENTS_PER_TICK, PATTERN_INTERVAL_SECS};

/// All mutable application state, owned exclusively by the consumer.
#[derive(Debug, Default)]
pub struct AppState {
    pub latest: Option<InsoleReading>,
    pub link_state: LinkState,
    /// Alerts derived from the latest reading
    pub active_alerts: Vec<String>,
    /// Output of the most recent pattern-analysis pass
    pub last_patterns: Vec<String>,
    pub readings_processed: u64,
    pub alerts_raised: u64,
}

pub struct Consumer {
    state: AppState,
    config: AppConfig,
    log: CsvLog,
    events: mpsc::Receiver<MonitorEvent>,
    cancel: CancellationToken,
}

impl Consumer {
    pub fn new(
        config: AppConfig,
        log: CsvLog,
        events: mpsc::Receiver<MonitorEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            state: AppState::default(),
            config,
            log,
            events,
            cancel,
        }
    }

    /// Run until cancelled or all producers are gone. Returns the final
    /// state for inspection.
    pub async fn run(mut self) -> AppState {
        info!("Consumer loop started");
        let mut drain_tick =
            tokio::time::interval(tokio::time::Duration::from_millis(CONSUMER_TICK_MS));
        drain_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut pattern_tick =
            tokio::time::interval(tokio::time::Duration::from_secs(PATTERN_INTERVAL_SECS));
        pattern_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // First interval tick fires immediately; skip the startup analysis
        pattern_tick.tick().await;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = drain_tick.tick() => {
                    if self.drain_events() {
                        break;
                    }
                }
                _ = pattern_tick.tick() => self.run_pattern_analysis(),
            }
        }

        info!(
            readings = self.state.readings_processed,
            alerts = self.state.alerts_raised,
            "Consumer loop stopped"
        );
        self.state
    }

    /// Drain up to [`MAX_EVENTS_PER_TICK`] queued events. Returns true when
    /// the channel is closed and empty.
    fn drain_events(&mut self) -> bool {
        for _ in 0..MAX_EVENTS_PER_TICK {
            match self.events.try_recv() {
                Ok(event) => self.apply_event(event),
                Err(mpsc::error::TryRecvError::Empty) => return false,
                Err(mpsc::error::TryRecvError::Disconnected) => return true,
            }
        }
        false
    }

    pub(crate) fn apply_event(&mut self, event: MonitorEvent) {
        match event {
            MonitorEvent::Reading(reading) => self.apply_reading(reading),
            MonitorEvent::ConnectionStatus { state, message } => {
                info!(state = %state, message, "Connection status changed");
                self.state.link_state = state;
            }
            MonitorEvent::Alert(alert) => {
                warn!(alert, "Worker alert");
                self.state.alerts_raised += 1;
            }
        }
    }

    fn apply_reading(&mut self, reading: InsoleReading) {
        // Log failures are non-fatal; latest still updates
        if let Err(e) = self.log.append(&reading) {
            warn!(error = %e, "Failed to persist reading");
        }

        let alerts = check_reading(&reading, &self.config.monitoring);
        for alert in &alerts {
            warn!(alert = alert.as_str(), "Threshold alert");
        }
        self.state.alerts_raised += alerts.len() as u64;
        self.state.active_alerts = alerts;
        self.state.readings_processed += 1;
        self.state.latest = Some(reading);
    }

    fn run_pattern_analysis(&mut self) {
        let window = match self.log.trailing_window(Utc::now()) {
            Ok(w) => w,
            Err(e) => {
                warn!(error = %e, "Pattern analysis skipped, cannot read log");
                return;
            }
        };

        let patterns = detect_patterns(&window, &self.config.monitoring, AnalysisDepth::Quick);
        for pattern in &patterns {
            info!(pattern = pattern.as_str(), "Pattern analysis");
        }
        self.state.last_patterns = patterns;
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &AppState {
        &self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn consumer(dir: &std::path::Path) -> (Consumer, mpsc::Sender<MonitorEvent>) {
        let log = CsvLog::open(dir.join("insole_data.csv")).unwrap();
        let (tx, rx) = mpsc::channel(16);
        let consumer = Consumer::new(AppConfig::default(), log, rx, CancellationToken::new());
        (consumer, tx)
    }

    fn reading(temp: f64) -> InsoleReading {
        InsoleReading {
            temperature: temp,
            humidity: 45.0,
            heel_pressure: 300,
            meta_pressure: 280,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn reading_event_persists_and_updates_latest() {
        let dir = tempfile::tempdir().unwrap();
        let (mut consumer, _tx) = consumer(dir.path());

        consumer.apply_event(MonitorEvent::Reading(reading(36.5)));
        consumer.apply_event(MonitorEvent::Reading(reading(36.7)));

        let state = consumer.state();
        assert_eq!(state.readings_processed, 2);
        assert!((state.latest.as_ref().unwrap().temperature - 36.7).abs() < 1e-9);
        assert!(state.active_alerts.is_empty());

        let persisted = consumer.log.read_all().unwrap();
        assert_eq!(persisted.len(), 2);
    }

    #[test]
    fn violating_reading_raises_alert() {
        let dir = tempfile::tempdir().unwrap();
        let (mut consumer, _tx) = consumer(dir.path());

        consumer.apply_event(MonitorEvent::Reading(reading(38.2)));
        let state = consumer.state();
        assert_eq!(state.active_alerts.len(), 1);
        assert!(state.active_alerts[0].contains("Temperature"));
        assert_eq!(state.alerts_raised, 1);

        // A normal reading clears the active set
        consumer.apply_event(MonitorEvent::Reading(reading(36.2)));
        assert!(consumer.state().active_alerts.is_empty());
    }

    #[test]
    fn connection_status_updates_state() {
        let dir = tempfile::tempdir().unwrap();
        let (mut consumer, _tx) = consumer(dir.path());

        consumer.apply_event(MonitorEvent::ConnectionStatus {
            state: LinkState::Connected,
            message: "Connected to test:1".to_string(),
        });
        assert_eq!(consumer.state().link_state, LinkState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn drain_is_capped_per_tick_and_loop_stops_on_close() {
        let dir = tempfile::tempdir().unwrap();
        let (consumer, tx) = consumer(dir.path());

        for _ in 0..12 {
            tx.send(MonitorEvent::Reading(reading(36.5))).await.unwrap();
        }
        drop(tx);

        // 12 events at 5 per 100ms tick need three ticks; the closed
        // channel then stops the loop.
        let state = consumer.run().await;
        assert_eq!(state.readings_processed, 12);
    }
}
