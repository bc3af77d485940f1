//! Data export
//!
//! Two surfaces: a timestamped raw copy of the reading log, and a clinician
//! report that prepends a 24-hour summary and detected patterns to the full
//! data section. Both are pure derived output; the log itself is untouched.

use crate::analysis::patterns::{detect_patterns, AnalysisDepth};
use crate::analysis::stats::DailySummary;
use crate::config::MonitoringConfig;
use crate::store::csv_log::{format_row, CsvLog, StoreError, LOG_HEADER, TIMESTAMP_FORMAT};
use chrono::{DateTime, Utc};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::info;

/// File-name stamp format for exports (`YYYYMMDD_HHMMSS`).
const EXPORT_STAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Copy the full log to `dir/insole_export_<stamp>.csv` and return the path.
pub fn export_raw(log: &CsvLog, dir: &Path, now: DateTime<Utc>) -> Result<PathBuf, StoreError> {
    let name = format!("insole_export_{}.csv", now.format(EXPORT_STAMP_FORMAT));
    let dest = dir.join(name);

    std::fs::copy(log.path(), &dest).map_err(|e| StoreError::Io {
        path: dest.clone(),
        source: e,
    })?;
    info!(path = %dest.display(), "Exported raw reading log");
    Ok(dest)
}

/// Write a clinician report to `dir/insole_report_<stamp>.csv`: summary
/// statistics, then detected patterns, then the complete data section.
pub fn export_report(
    log: &CsvLog,
    config: &MonitoringConfig,
    dir: &Path,
    now: DateTime<Utc>,
) -> Result<PathBuf, StoreError> {
    let name = format!("insole_report_{}.csv", now.format(EXPORT_STAMP_FORMAT));
    let dest = dir.join(name);

    let window = log.trailing_window(now)?;
    let summary = DailySummary::compute(&window, config);
    let patterns = detect_patterns(&window, config, AnalysisDepth::Deep);
    let all = log.read_all()?;

    let contents = render_report(&summary, &patterns, &all, now);
    std::fs::write(&dest, contents).map_err(|e| StoreError::Io {
        path: dest.clone(),
        source: e,
    })?;
    info!(path = %dest.display(), points = all.len(), "Exported clinician report");
    Ok(dest)
}

fn render_report(
    summary: &DailySummary,
    patterns: &[String],
    all: &[crate::types::InsoleReading],
    now: DateTime<Utc>,
) -> String {
    let mut out = String::new();
    // String formatting is infallible; writeln! on String cannot error
    let _ = writeln!(out, "SMART INSOLE MONITORING REPORT");
    let _ = writeln!(out, "Generated: {}", now.format(TIMESTAMP_FORMAT));
    let _ = writeln!(out);

    let _ = writeln!(out, "SUMMARY (last 24 hours, {} readings)", summary.point_count);
    let _ = writeln!(
        out,
        "Temperature: avg {:.1}C, min {:.1}C, max {:.1}C",
        summary.avg_temperature, summary.min_temperature, summary.max_temperature
    );
    let _ = writeln!(
        out,
        "Humidity: avg {:.1}%, max {:.1}%",
        summary.avg_humidity, summary.max_humidity
    );
    let _ = writeln!(
        out,
        "Heel pressure: avg {:.0}, max {}",
        summary.avg_heel_pressure, summary.max_heel_pressure
    );
    let _ = writeln!(
        out,
        "Metatarsal pressure: avg {:.0}, max {}",
        summary.avg_meta_pressure, summary.max_meta_pressure
    );
    let _ = writeln!(
        out,
        "Readings above any threshold: {:.1}%",
        summary.percent_above_threshold
    );
    let _ = writeln!(
        out,
        "Alert transitions per hour: {:.2}",
        summary.alert_transitions_per_hour
    );
    let _ = writeln!(out);

    let _ = writeln!(out, "THRESHOLD VIOLATIONS");
    for (name, v) in [
        ("Temperature", summary.temperature_violations),
        ("Humidity", summary.humidity_violations),
        ("Heel pressure", summary.heel_violations),
        ("Metatarsal pressure", summary.meta_violations),
    ] {
        let _ = writeln!(out, "{name}: {} readings ({:.1}%)", v.count, v.percent);
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "DETECTED PATTERNS");
    for pattern in patterns {
        let _ = writeln!(out, "- {pattern}");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "DATA LOG");
    let _ = writeln!(out, "{LOG_HEADER}");
    for reading in all {
        let _ = writeln!(out, "{}", format_row(reading));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::InsoleReading;
    use chrono::{Duration, TimeZone};

    fn seed_log(dir: &Path, now: DateTime<Utc>, n: usize) -> CsvLog {
        let log = CsvLog::open(dir.join("insole_data.csv")).unwrap();
        for i in 0..n {
            log.append(&InsoleReading {
                temperature: 36.2,
                humidity: 45.0,
                heel_pressure: 300,
                meta_pressure: 280,
                timestamp: now - Duration::minutes((n - i) as i64),
            })
            .unwrap();
        }
        log
    }

    #[test]
    fn raw_export_is_byte_identical_copy() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 14, 30, 5).unwrap();
        let log = seed_log(dir.path(), now, 5);

        let dest = export_raw(&log, dir.path(), now).unwrap();
        assert_eq!(
            dest.file_name().unwrap().to_str().unwrap(),
            "insole_export_20250601_143005.csv"
        );
        assert_eq!(
            std::fs::read_to_string(log.path()).unwrap(),
            std::fs::read_to_string(&dest).unwrap()
        );
    }

    #[test]
    fn report_contains_summary_patterns_and_data() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 14, 30, 5).unwrap();
        let log = seed_log(dir.path(), now, 12);

        let dest = export_report(&log, &MonitoringConfig::default(), dir.path(), now).unwrap();
        let report = std::fs::read_to_string(&dest).unwrap();

        assert!(report.contains("SUMMARY (last 24 hours, 12 readings)"));
        assert!(report.contains("No significant patterns detected"));
        assert!(report.contains(LOG_HEADER));
        assert_eq!(report.matches("36.2,45.0,300,280").count(), 12);
    }
}
