//! Shared data structures for the insole monitoring pipeline
//!
//! This module defines the core types flowing through the system:
//! - `InsoleReading`: one sample of all four sensor channels
//! - `Channel`: the four measured quantities
//! - `LinkState`: wireless link connection state machine
//! - `MonitorEvent`: typed events from background workers to the consumer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Sensor Reading
// ============================================================================

/// One sample of the insole's four sensor channels.
///
/// Exactly one "latest" reading exists at process scope, owned by the
/// consumer task and overwritten on each successful acquisition. Timestamps
/// are assumed monotonically non-decreasing across successive updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsoleReading {
    /// Skin temperature (°C)
    pub temperature: f64,
    /// Relative humidity inside the insole (%)
    pub humidity: f64,
    /// Heel pressure sensor (raw units)
    pub heel_pressure: u32,
    /// Metatarsal pressure sensor (raw units)
    pub meta_pressure: u32,
    /// Acquisition time
    pub timestamp: DateTime<Utc>,
}

impl InsoleReading {
    /// Value of a single channel as f64 (pressures widened).
    pub fn value(&self, channel: Channel) -> f64 {
        match channel {
            Channel::Temperature => self.temperature,
            Channel::Humidity => self.humidity,
            Channel::HeelPressure => f64::from(self.heel_pressure),
            Channel::MetaPressure => f64::from(self.meta_pressure),
        }
    }
}

/// One of the four measured quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Temperature,
    Humidity,
    HeelPressure,
    MetaPressure,
}

impl Channel {
    /// All channels in wire/log column order.
    pub const ALL: [Channel; 4] = [
        Channel::Temperature,
        Channel::Humidity,
        Channel::HeelPressure,
        Channel::MetaPressure,
    ];

    /// Display name used in alerts and pattern messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Channel::Temperature => "Temperature",
            Channel::Humidity => "Humidity",
            Channel::HeelPressure => "Heel Pressure",
            Channel::MetaPressure => "Metatarsal Pressure",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Link Connection State
// ============================================================================

/// Wireless link connection state.
///
/// Transitions: `Disconnected -> Connecting -> Connected -> (error) ->
/// Disconnected`, driven by the link supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkState::Disconnected => write!(f, "Disconnected"),
            LinkState::Connecting => write!(f, "Connecting"),
            LinkState::Connected => write!(f, "Connected"),
        }
    }
}

// ============================================================================
// Worker -> Consumer Events
// ============================================================================

/// Typed event sent from background workers to the single consumer task.
///
/// Workers never touch application state directly; everything flows through
/// the bounded event channel and is applied by the consumer.
#[derive(Debug, Clone)]
pub enum MonitorEvent {
    /// A new sensor reading (real or synthetic).
    Reading(InsoleReading),
    /// Link connection state changed.
    ConnectionStatus { state: LinkState, message: String },
    /// A standalone alert raised by a worker.
    Alert(String),
}
