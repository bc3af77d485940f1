//! Background workers and the single-consumer event loop
//!
//! Three producers feed one bounded channel of typed [`MonitorEvent`]s:
//! the acquisition supervisor (live source), the simulation worker
//! (synthetic fallback), and ad-hoc alerts. A single consumer owns all
//! application state and drains the queue on a short fixed tick, so no
//! shared mutable state exists outside it. Connection state is published
//! on a watch channel; the simulation worker samples it to stay quiet
//! while a live source is connected.

use crate::types::{LinkState, MonitorEvent};
use tokio::sync::{mpsc, watch};

pub mod consumer;
pub mod simulation;
pub mod supervisor;

pub use consumer::{AppState, Consumer};
pub use simulation::SimulationWorker;
pub use supervisor::SourceSupervisor;

/// Bounded depth of the producer→consumer event queue.
pub const EVENT_QUEUE_DEPTH: usize = 64;

/// Consumer drain cadence.
pub const CONSUMER_TICK_MS: u64 = 100;

/// Maximum events processed per consumer tick.
pub const MAX_EVENTS_PER_TICK: usize = 5;

/// Cadence of the periodic pattern-analysis pass.
pub const PATTERN_INTERVAL_SECS: u64 = 60;

/// Shared plumbing between workers and the consumer.
pub struct MonitorChannels {
    pub events_tx: mpsc::Sender<MonitorEvent>,
    pub events_rx: mpsc::Receiver<MonitorEvent>,
    pub link_state_tx: watch::Sender<LinkState>,
    pub link_state_rx: watch::Receiver<LinkState>,
}

impl MonitorChannels {
    pub fn new() -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let (link_state_tx, link_state_rx) = watch::channel(LinkState::Disconnected);
        Self {
            events_tx,
            events_rx,
            link_state_tx,
            link_state_rx,
        }
    }
}

impl Default for MonitorChannels {
    fn default() -> Self {
        Self::new()
    }
}
