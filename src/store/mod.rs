//! Durable storage for readings and device registry
//!
//! Flat-file persistence: an append-only CSV log of every reading, a JSON
//! registry of previously connected devices, and derived export surfaces.

pub mod csv_log;
pub mod export;
pub mod known_devices;

pub use csv_log::{CsvLog, StoreError, LOG_HEADER, TIMESTAMP_FORMAT};
pub use known_devices::{KnownDevice, KnownDevices};
