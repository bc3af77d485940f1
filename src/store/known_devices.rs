//! Known-devices registry
//!
//! JSON list of previously connected device addresses, deduplicated by MAC.
//! Each entry carries the last successful connection time; reconnecting to
//! a known device refreshes its stamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

use super::csv_log::StoreError;
use super::TIMESTAMP_FORMAT;

/// One registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownDevice {
    pub mac: String,
    /// `YYYY-MM-DD HH:MM:SS`, matching the reading log's timestamp format
    pub last_connected: String,
}

/// Registry of previously connected devices.
#[derive(Debug, Clone)]
pub struct KnownDevices {
    path: PathBuf,
}

impl KnownDevices {
    /// Open the registry at `path`, creating an empty list if absent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            std::fs::write(&path, "[]").map_err(|e| StoreError::Io {
                path: path.clone(),
                source: e,
            })?;
        }
        Ok(Self { path })
    }

    /// All entries. A corrupt registry is treated as empty, not fatal.
    pub fn list(&self) -> Result<Vec<KnownDevice>, StoreError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        match serde_json::from_str(&contents) {
            Ok(devices) => Ok(devices),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Known-devices registry corrupt — treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Record a successful connection to `mac` at `when`.
    ///
    /// Deduplicates by address: an existing entry has its timestamp
    /// refreshed, a new address is appended.
    pub fn record_connection(&self, mac: &str, when: DateTime<Utc>) -> Result<(), StoreError> {
        let mut devices = self.list()?;
        let stamp = when.format(TIMESTAMP_FORMAT).to_string();

        match devices.iter_mut().find(|d| d.mac == mac) {
            Some(existing) => existing.last_connected = stamp,
            None => devices.push(KnownDevice {
                mac: mac.to_string(),
                last_connected: stamp,
            }),
        }

        let contents = serde_json::to_string_pretty(&devices).unwrap_or_else(|_| "[]".to_string());
        std::fs::write(&self.path, contents).map_err(|e| StoreError::Io {
            path: self.path.clone(),
            source: e,
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn records_and_deduplicates_by_mac() {
        let dir = tempfile::tempdir().unwrap();
        let registry = KnownDevices::open(dir.path().join("known_devices.json")).unwrap();

        let t1 = Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2025, 6, 1, 10, 30, 0).unwrap();

        registry.record_connection("00:11:22:33:44:55", t1).unwrap();
        registry.record_connection("AA:BB:CC:DD:EE:FF", t1).unwrap();
        registry.record_connection("00:11:22:33:44:55", t2).unwrap();

        let devices = registry.list().unwrap();
        assert_eq!(devices.len(), 2);
        let first = devices.iter().find(|d| d.mac == "00:11:22:33:44:55").unwrap();
        assert_eq!(first.last_connected, "2025-06-01 10:30:00");
    }

    #[test]
    fn corrupt_registry_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("known_devices.json");
        std::fs::write(&path, "{not json").unwrap();

        let registry = KnownDevices::open(&path).unwrap();
        assert!(registry.list().unwrap().is_empty());
    }
}
