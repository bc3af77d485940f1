//! Instantaneous threshold checks
//!
//! Pure function of (reading, thresholds): no state, recomputed on demand.

use crate::config::MonitoringConfig;
use crate::types::InsoleReading;

/// Compare a reading against the configured limits and return one formatted
/// alert per violated channel. An empty vec means all channels are normal.
pub fn check_reading(reading: &InsoleReading, config: &MonitoringConfig) -> Vec<String> {
    let mut alerts = Vec::new();

    if reading.temperature > config.temperature_threshold {
        alerts.push(format!(
            "⚠️ High Temperature: {:.1}°C",
            reading.temperature
        ));
    }
    if reading.humidity > config.humidity_threshold {
        alerts.push(format!("⚠️ High Humidity: {:.1}%", reading.humidity));
    }
    if reading.heel_pressure > config.pressure_threshold {
        alerts.push(format!("⚠️ High Heel Pressure: {}", reading.heel_pressure));
    }
    if reading.meta_pressure > config.pressure_threshold {
        alerts.push(format!(
            "⚠️ High Metatarsal Pressure: {}",
            reading.meta_pressure
        ));
    }

    alerts
}

/// Whether any channel of `reading` exceeds its limit.
pub fn any_violation(reading: &InsoleReading, config: &MonitoringConfig) -> bool {
    reading.temperature > config.temperature_threshold
        || reading.humidity > config.humidity_threshold
        || reading.heel_pressure > config.pressure_threshold
        || reading.meta_pressure > config.pressure_threshold
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn reading(temp: f64, humidity: f64, heel: u32, meta: u32) -> InsoleReading {
        InsoleReading {
            temperature: temp,
            humidity,
            heel_pressure: heel,
            meta_pressure: meta,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn high_temperature_yields_exactly_one_alert() {
        let config = MonitoringConfig::default(); // temp threshold 37.0
        let alerts = check_reading(&reading(38.0, 45.0, 300, 300), &config);
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("Temperature"));
        assert!(alerts[0].contains("38.0"));
    }

    #[test]
    fn all_channels_normal_yields_no_alerts() {
        let config = MonitoringConfig::default();
        let alerts = check_reading(&reading(36.5, 50.0, 400, 400), &config);
        assert!(alerts.is_empty());
    }

    #[test]
    fn every_violated_channel_is_named() {
        let config = MonitoringConfig::default();
        let alerts = check_reading(&reading(38.0, 70.0, 600, 550), &config);
        assert_eq!(alerts.len(), 4);
        assert!(alerts.iter().any(|a| a.contains("Heel Pressure")));
        assert!(alerts.iter().any(|a| a.contains("Metatarsal Pressure")));
        assert!(alerts.iter().any(|a| a.contains("Humidity")));
    }

    #[test]
    fn threshold_is_exclusive() {
        let config = MonitoringConfig::default();
        // Exactly at threshold is not a violation
        let alerts = check_reading(&reading(37.0, 60.0, 500, 500), &config);
        assert!(alerts.is_empty());
        assert!(!any_violation(&reading(37.0, 60.0, 500, 500), &config));
    }
}
