//! SoleGuard: smart insole monitoring engine
//!
//! Acquires temperature, humidity and plantar-pressure readings from a
//! wireless insole (or a remote dashboard, or a synthetic generator),
//! persists them to an append-only CSV log, and derives threshold alerts
//! and trailing-window patterns from the stored history.
//!
//! ## Architecture
//!
//! - **Acquisition**: interchangeable live sources behind `ReadingSource`
//! - **Simulation**: time-of-day-correlated synthetic fallback
//! - **Workers**: supervisor + generator feeding one bounded event channel
//! - **Consumer**: single owner of application state, drains on a fixed tick
//! - **Analysis**: instantaneous threshold checks, pattern heuristics,
//!   daily summary statistics

pub mod acquisition;
pub mod analysis;
pub mod config;
pub mod sim;
pub mod store;
pub mod types;
pub mod worker;

// Re-export configuration
pub use config::{AppConfig, ConfigError};

// Re-export commonly used types
pub use types::{Channel, InsoleReading, LinkState, MonitorEvent};

// Re-export acquisition sources
pub use acquisition::{AcquisitionError, DashboardClient, LinkClient, ReadingSource};

// Re-export storage
pub use store::{CsvLog, KnownDevices, StoreError};

// Re-export analysis entry points
pub use analysis::{check_reading, detect_patterns, AnalysisDepth, DailySummary};

// Re-export the generator and worker plumbing
pub use sim::SyntheticGenerator;
pub use worker::{AppState, Consumer, MonitorChannels, SimulationWorker, SourceSupervisor};
