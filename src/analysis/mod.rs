//! Alerting and insight generation over the reading store
//!
//! - `threshold`: instantaneous per-reading limit checks
//! - `patterns`: heuristics over the 24-hour trailing window
//! - `stats`: descriptive summary statistics for reports

pub mod patterns;
pub mod stats;
pub mod threshold;

pub use patterns::{detect_patterns, AnalysisDepth};
pub use stats::DailySummary;
pub use threshold::check_reading;
