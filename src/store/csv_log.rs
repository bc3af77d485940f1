//! Append-only CSV log of sensor readings
//!
//! One header row, then one data row per reading. Insertion order is
//! chronological order: the file is never reordered, truncated, or
//! compacted by the running process. Created with its header on first use.

use crate::types::InsoleReading;
use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// CSV header row, fixed column order.
pub const LOG_HEADER: &str = "Timestamp,Temperature,Humidity,Heel_Pressure,Meta_Pressure";

/// Timestamp format used in the log (`YYYY-MM-DD HH:MM:SS`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Storage errors. Log-write failures are logged by callers and never stop
/// acquisition or generation.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Handle to the durable reading log.
#[derive(Debug, Clone)]
pub struct CsvLog {
    path: PathBuf,
}

impl CsvLog {
    /// Open the log at `path`, creating it with a header row if absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            let mut file = File::create(&path).map_err(|e| StoreError::Io {
                path: path.clone(),
                source: e,
            })?;
            writeln!(file, "{LOG_HEADER}").map_err(|e| StoreError::Io {
                path: path.clone(),
                source: e,
            })?;
            tracing::info!(path = %path.display(), "Created new reading log");
        }
        Ok(Self { path })
    }

    /// Path of the underlying file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one reading. Fractional sensor values keep one decimal of
    /// precision in the log, matching what the device reports.
    pub fn append(&self, reading: &InsoleReading) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| StoreError::Io {
                path: self.path.clone(),
                source: e,
            })?;
        writeln!(file, "{}", format_row(reading)).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(())
    }

    /// Read back every reading in insertion order.
    ///
    /// Malformed rows are skipped with a warning; a torn final row from a
    /// crashed writer must not poison the whole history.
    pub fn read_all(&self) -> Result<Vec<InsoleReading>, StoreError> {
        let file = File::open(&self.path).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        let reader = BufReader::new(file);
        let mut readings = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = match line_result {
                Ok(l) => l,
                Err(e) => {
                    tracing::warn!(line = line_num + 1, error = %e, "Error reading log line");
                    continue;
                }
            };

            // Header row
            if line_num == 0 && line.starts_with("Timestamp") {
                continue;
            }
            if line.trim().is_empty() {
                continue;
            }

            match parse_row(&line) {
                Ok(reading) => readings.push(reading),
                Err(e) => {
                    tracing::warn!(line = line_num + 1, error = %e, "Skipping malformed log row");
                }
            }
        }

        Ok(readings)
    }

    /// Readings within the last 24 hours relative to `now`, in order.
    pub fn trailing_window(&self, now: DateTime<Utc>) -> Result<Vec<InsoleReading>, StoreError> {
        let cutoff = now - Duration::hours(24);
        let mut readings = self.read_all()?;
        readings.retain(|r| r.timestamp > cutoff);
        Ok(readings)
    }
}

/// Format one reading as a log row.
pub fn format_row(reading: &InsoleReading) -> String {
    format!(
        "{},{:.1},{:.1},{},{}",
        reading.timestamp.format(TIMESTAMP_FORMAT),
        reading.temperature,
        reading.humidity,
        reading.heel_pressure,
        reading.meta_pressure
    )
}

/// Parse one log row back into a reading.
fn parse_row(line: &str) -> Result<InsoleReading, String> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 5 {
        return Err(format!("Expected 5 fields, got {}", fields.len()));
    }

    let naive = NaiveDateTime::parse_from_str(fields[0].trim(), TIMESTAMP_FORMAT)
        .map_err(|e| format!("Cannot parse timestamp '{}': {e}", fields[0]))?;
    let timestamp = Utc.from_utc_datetime(&naive);

    let temperature = parse_f64(fields[1], "temperature")?;
    let humidity = parse_f64(fields[2], "humidity")?;
    // Pressures may carry a decimal from older writers; truncate like the device does
    let heel_pressure = parse_f64(fields[3], "heel_pressure")? as u32;
    let meta_pressure = parse_f64(fields[4], "meta_pressure")? as u32;

    Ok(InsoleReading {
        temperature,
        humidity,
        heel_pressure,
        meta_pressure,
        timestamp,
    })
}

fn parse_f64(s: &str, field: &str) -> Result<f64, String> {
    s.trim()
        .parse::<f64>()
        .map_err(|_| format!("Cannot parse {field} as f64: '{s}'"))
}
