//! Trailing-window pattern detection
//!
//! Lightweight heuristics over the last 24 hours of readings: sustained
//! threshold exceedance, rapid deltas, and time-of-day temperature bias.
//! Requires at least [`MIN_POINTS`] qualifying points; below that a single
//! fallback message is returned and nothing is ever an error.

use crate::config::MonitoringConfig;
use crate::types::{Channel, InsoleReading};
use chrono::{Local, Timelike};
use statrs::statistics::Statistics;

/// Minimum qualifying points for any pattern analysis.
pub const MIN_POINTS: usize = 10;

/// Temperature delta between the 3rd-most-recent and most recent point
/// that counts as a rapid increase (°C).
pub const RAPID_TEMP_DELTA: f64 = 1.0;

/// Humidity delta that counts as a rapid increase (%).
pub const RAPID_HUMIDITY_DELTA: f64 = 10.0;

/// Max pairwise difference among bucket mean temperatures that counts as a
/// time-of-day bias (°C).
pub const TIME_OF_DAY_DELTA: f64 = 0.5;

/// Fallback message when fewer than [`MIN_POINTS`] points are available.
pub const INSUFFICIENT_DATA: &str = "Not enough data for pattern analysis";

/// Fallback message when nothing triggered.
pub const NO_PATTERNS: &str = "No significant patterns detected in current data";

/// How far back the sustained-exceedance scan looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisDepth {
    /// 3+ of the most recent 5 points over threshold (order-insensitive).
    #[default]
    Quick,
    /// A run of 3+ consecutive exceedances within the most recent 10 points.
    Deep,
}

/// Detect patterns in the 24-hour trailing window.
///
/// `points` must be in chronological order (the log guarantees insertion
/// order == chronological order). Returns at least one message: either the
/// detected patterns, or a single fallback string.
pub fn detect_patterns(
    points: &[InsoleReading],
    config: &MonitoringConfig,
    depth: AnalysisDepth,
) -> Vec<String> {
    if points.len() < MIN_POINTS {
        return vec![INSUFFICIENT_DATA.to_string()];
    }

    let mut patterns = Vec::new();

    for channel in Channel::ALL {
        if sustained_exceedance(points, channel, config, depth) {
            patterns.push(sustained_message(channel).to_string());
        }
    }

    rapid_changes(points, &mut patterns);
    time_of_day_bias(points, &mut patterns);

    if patterns.is_empty() {
        patterns.push(NO_PATTERNS.to_string());
    }
    patterns
}

/// Per-channel threshold as f64.
fn threshold_for(channel: Channel, config: &MonitoringConfig) -> f64 {
    match channel {
        Channel::Temperature => config.temperature_threshold,
        Channel::Humidity => config.humidity_threshold,
        Channel::HeelPressure | Channel::MetaPressure => f64::from(config.pressure_threshold),
    }
}

/// Sustained exceedance check for one channel.
///
/// Emits at most one pattern per channel per run regardless of how many
/// points qualify.
fn sustained_exceedance(
    points: &[InsoleReading],
    channel: Channel,
    config: &MonitoringConfig,
    depth: AnalysisDepth,
) -> bool {
    let threshold = threshold_for(channel, config);

    match depth {
        AnalysisDepth::Quick => {
            let tail = &points[points.len().saturating_sub(5)..];
            tail.iter().filter(|r| r.value(channel) > threshold).count() >= 3
        }
        AnalysisDepth::Deep => {
            let tail = &points[points.len().saturating_sub(10)..];
            let mut run = 0usize;
            for reading in tail {
                if reading.value(channel) > threshold {
                    run += 1;
                    if run >= 3 {
                        return true;
                    }
                } else {
                    run = 0;
                }
            }
            false
        }
    }
}

fn sustained_message(channel: Channel) -> &'static str {
    match channel {
        Channel::Temperature => "Sustained high temperature detected - potential inflammation",
        Channel::Humidity => "Sustained high humidity detected - risk of skin maceration",
        Channel::HeelPressure => "Sustained high heel pressure detected - adjust footwear/activity",
        Channel::MetaPressure => {
            "Sustained high metatarsal pressure detected - check for callus formation"
        }
    }
}

/// Rapid temperature/humidity increase between the 3rd-most-recent and the
/// most recent point.
fn rapid_changes(points: &[InsoleReading], patterns: &mut Vec<String>) {
    let n = points.len();
    if n < 3 {
        return;
    }
    let newest = &points[n - 1];
    let third = &points[n - 3];

    if newest.temperature - third.temperature > RAPID_TEMP_DELTA {
        patterns.push("Rapid temperature increase detected".to_string());
    }
    if newest.humidity - third.humidity > RAPID_HUMIDITY_DELTA {
        patterns.push("Rapid humidity increase detected".to_string());
    }
}

/// Partition points by local hour into morning (05–12), afternoon (12–18)
/// and evening buckets, and flag whichever bucket runs hottest when the
/// spread exceeds [`TIME_OF_DAY_DELTA`].
fn time_of_day_bias(points: &[InsoleReading], patterns: &mut Vec<String>) {
    let mut morning = Vec::new();
    let mut afternoon = Vec::new();
    let mut evening = Vec::new();

    for reading in points {
        let hour = reading.timestamp.with_timezone(&Local).hour();
        match hour {
            5..=11 => morning.push(reading.temperature),
            12..=17 => afternoon.push(reading.temperature),
            _ => evening.push(reading.temperature),
        }
    }

    if morning.is_empty() || afternoon.is_empty() || evening.is_empty() {
        return;
    }

    let avg_morning = morning.mean();
    let avg_afternoon = afternoon.mean();
    let avg_evening = evening.mean();

    let max_diff = (avg_morning - avg_afternoon)
        .abs()
        .max((avg_afternoon - avg_evening).abs())
        .max((avg_evening - avg_morning).abs());

    if max_diff > TIME_OF_DAY_DELTA {
        let highest = avg_morning.max(avg_afternoon).max(avg_evening);
        if highest == avg_morning {
            patterns.push(
                "Temperature peaks in morning - check for overnight inflammation".to_string(),
            );
        } else if highest == avg_afternoon {
            patterns.push(
                "Temperature peaks in afternoon - may indicate activity-related stress".to_string(),
            );
        } else {
            patterns.push(
                "Temperature peaks in evening - potential cumulative daily stress".to_string(),
            );
        }
    }
}
