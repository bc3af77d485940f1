//! Descriptive statistics over the 24-hour trailing window
//!
//! Feeds both the status view and the exported report. All values are
//! derived; nothing here mutates the store.

use crate::analysis::threshold::any_violation;
use crate::config::MonitoringConfig;
use crate::types::{Channel, InsoleReading};
use statrs::statistics::Statistics;

/// Per-channel violation tally.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelViolations {
    pub count: usize,
    pub percent: f64,
}

/// Summary of the trailing 24-hour window.
#[derive(Debug, Clone, Default)]
pub struct DailySummary {
    pub point_count: usize,
    pub avg_temperature: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub avg_humidity: f64,
    pub max_humidity: f64,
    pub avg_heel_pressure: f64,
    pub max_heel_pressure: u32,
    pub avg_meta_pressure: f64,
    pub max_meta_pressure: u32,
    /// Percent of points where at least one channel exceeds its limit.
    pub percent_above_threshold: f64,
    /// Normal→alert edges divided by the window's hour span.
    pub alert_transitions_per_hour: f64,
    pub temperature_violations: ChannelViolations,
    pub humidity_violations: ChannelViolations,
    pub heel_violations: ChannelViolations,
    pub meta_violations: ChannelViolations,
}

impl DailySummary {
    /// Compute a summary for `points` (chronological order expected).
    /// An empty window yields the all-zero summary.
    pub fn compute(points: &[InsoleReading], config: &MonitoringConfig) -> Self {
        if points.is_empty() {
            return Self::default();
        }

        let temps: Vec<f64> = points.iter().map(|r| r.temperature).collect();
        let humidities: Vec<f64> = points.iter().map(|r| r.humidity).collect();
        let heels: Vec<f64> = points.iter().map(|r| f64::from(r.heel_pressure)).collect();
        let metas: Vec<f64> = points.iter().map(|r| f64::from(r.meta_pressure)).collect();

        let n = points.len();
        let above = points.iter().filter(|r| any_violation(r, config)).count();

        Self {
            point_count: n,
            avg_temperature: (&temps).mean(),
            min_temperature: (&temps).min(),
            max_temperature: (&temps).max(),
            avg_humidity: (&humidities).mean(),
            max_humidity: (&humidities).max(),
            avg_heel_pressure: (&heels).mean(),
            max_heel_pressure: points.iter().map(|r| r.heel_pressure).max().unwrap_or(0),
            avg_meta_pressure: (&metas).mean(),
            max_meta_pressure: points.iter().map(|r| r.meta_pressure).max().unwrap_or(0),
            percent_above_threshold: percent(above, n),
            alert_transitions_per_hour: transitions_per_hour(points, config),
            temperature_violations: channel_violations(points, Channel::Temperature, config),
            humidity_violations: channel_violations(points, Channel::Humidity, config),
            heel_violations: channel_violations(points, Channel::HeelPressure, config),
            meta_violations: channel_violations(points, Channel::MetaPressure, config),
        }
    }
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

fn channel_violations(
    points: &[InsoleReading],
    channel: Channel,
    config: &MonitoringConfig,
) -> ChannelViolations {
    let threshold = match channel {
        Channel::Temperature => config.temperature_threshold,
        Channel::Humidity => config.humidity_threshold,
        Channel::HeelPressure | Channel::MetaPressure => f64::from(config.pressure_threshold),
    };
    let count = points
        .iter()
        .filter(|r| r.value(channel) > threshold)
        .count();
    ChannelViolations {
        count,
        percent: percent(count, points.len()),
    }
}

/// Count normal→alert edges and normalize by the window's hour span.
///
/// A window shorter than one hour is treated as one hour so a burst of
/// alerts in a short session does not report an absurd rate.
fn transitions_per_hour(points: &[InsoleReading], config: &MonitoringConfig) -> f64 {
    let mut transitions = 0usize;
    let mut in_alert = false;
    for reading in points {
        let alerting = any_violation(reading, config);
        if alerting && !in_alert {
            transitions += 1;
        }
        in_alert = alerting;
    }

    let span = points[points.len() - 1].timestamp - points[0].timestamp;
    let hours = (span.num_seconds() as f64 / 3600.0).max(1.0);
    transitions as f64 / hours
}
