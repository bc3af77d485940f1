//! Application Configuration
//!
//! All acquisition parameters, alert thresholds, and simulation toggles as
//! operator-tunable TOML values. Every field carries a `#[serde(default)]`
//! so partial files deserialize cleanly: missing keys backfill from the
//! built-in defaults that match the original firmware constants.
//!
//! ## Loading Order
//!
//! 1. Explicit path passed on the command line
//! 2. `SOLEGUARD_CONFIG` environment variable
//! 3. `insole_config.toml` in the current working directory
//! 4. Built-in defaults
//!
//! A missing or corrupt file is not an error: defaults are used and written
//! back so the operator has a file to edit.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Default config file name searched in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "insole_config.toml";

/// Environment variable overriding the config path.
pub const CONFIG_ENV_VAR: &str = "SOLEGUARD_CONFIG";

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ============================================================================
// Sections
// ============================================================================

/// Wireless link parameters.
///
/// The section keeps the `bluetooth` name for compatibility with existing
/// config files; the link itself is a generic stream socket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BluetoothConfig {
    /// Device address (MAC or hostname)
    #[serde(default = "defaults::mac_address")]
    pub mac_address: String,
    /// Serial channel / TCP port
    #[serde(default = "defaults::port")]
    pub port: u16,
    /// Whether the supervisor retries after a lost connection
    #[serde(default = "defaults::auto_reconnect")]
    pub auto_reconnect: bool,
    /// Delay between reconnection attempts (seconds)
    #[serde(default = "defaults::reconnect_interval")]
    pub reconnect_interval: u64,
}

impl Default for BluetoothConfig {
    fn default() -> Self {
        Self {
            mac_address: defaults::mac_address(),
            port: defaults::port(),
            auto_reconnect: defaults::auto_reconnect(),
            reconnect_interval: defaults::reconnect_interval(),
        }
    }
}

/// Monitoring cadence and alert thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    /// Polling / generation interval (seconds)
    #[serde(default = "defaults::update_interval")]
    pub update_interval: u64,
    /// Temperature alert threshold (°C)
    #[serde(default = "defaults::temperature_threshold")]
    pub temperature_threshold: f64,
    /// Humidity alert threshold (%)
    #[serde(default = "defaults::humidity_threshold")]
    pub humidity_threshold: f64,
    /// Pressure alert threshold, shared by both pressure channels
    #[serde(default = "defaults::pressure_threshold")]
    pub pressure_threshold: u32,
    /// Whether alert events should request an audible cue downstream
    #[serde(default = "defaults::alert_sound")]
    pub alert_sound: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            update_interval: defaults::update_interval(),
            temperature_threshold: defaults::temperature_threshold(),
            humidity_threshold: defaults::humidity_threshold(),
            pressure_threshold: defaults::pressure_threshold(),
            alert_sound: defaults::alert_sound(),
        }
    }
}

/// Synthetic data generation toggles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Generate synthetic readings while no live link is connected
    #[serde(default = "defaults::simulation_enabled")]
    pub enabled: bool,
    /// Smooth, continuity-clamped trajectories (false = i.i.d. around baseline)
    #[serde(default = "defaults::realistic_variation")]
    pub realistic_variation: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: defaults::simulation_enabled(),
            realistic_variation: defaults::realistic_variation(),
        }
    }
}

/// Presentation-layer hints, carried for config-file compatibility.
///
/// The monitoring core does not render anything; these keys are preserved
/// so an external UI consuming the feed shares one config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "defaults::theme")]
    pub theme: String,
    #[serde(default = "defaults::graph_points")]
    pub graph_points: usize,
    #[serde(default = "defaults::auto_export")]
    pub auto_export: bool,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            theme: defaults::theme(),
            graph_points: defaults::graph_points(),
            auto_export: defaults::auto_export(),
        }
    }
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a monitor deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub bluetooth: BluetoothConfig,
    #[serde(default)]
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

impl AppConfig {
    /// Load configuration using the standard search order, falling back to
    /// defaults on any failure. A corrupt or missing file is replaced with
    /// a freshly saved defaults file at the resolved path.
    pub fn load_or_default(explicit_path: Option<&Path>) -> (Self, PathBuf) {
        let path = Self::resolve_path(explicit_path);

        match Self::load_from_file(&path) {
            Ok(config) => {
                info!(path = %path.display(), "Loaded configuration");
                (config, path)
            }
            Err(ConfigError::Io(_, ref io)) if io.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "No config file found — writing defaults");
                let config = Self::default();
                if let Err(e) = config.save(&path) {
                    warn!(error = %e, "Failed to write default config");
                }
                (config, path)
            }
            Err(e) => {
                warn!(error = %e, "Config unreadable — replacing with defaults");
                let config = Self::default();
                if let Err(e) = config.save(&path) {
                    warn!(error = %e, "Failed to re-save default config");
                }
                (config, path)
            }
        }
    }

    /// Resolve the config path: explicit flag, env var, then working dir.
    fn resolve_path(explicit_path: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit_path {
            return p.to_path_buf();
        }
        if let Ok(env_path) = std::env::var(CONFIG_ENV_VAR) {
            return PathBuf::from(env_path);
        }
        PathBuf::from(DEFAULT_CONFIG_FILE)
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config: Self =
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?;
        Ok(config)
    }

    /// Persist the current configuration back to disk.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Ok(())
    }
}

/// Built-in defaults matching the original firmware constants.
mod defaults {
    pub fn mac_address() -> String {
        "00:11:22:33:44:55".to_string()
    }
    pub fn port() -> u16 {
        1
    }
    pub fn auto_reconnect() -> bool {
        true
    }
    pub fn reconnect_interval() -> u64 {
        30
    }
    pub fn update_interval() -> u64 {
        5
    }
    pub fn temperature_threshold() -> f64 {
        37.0
    }
    pub fn humidity_threshold() -> f64 {
        60.0
    }
    pub fn pressure_threshold() -> u32 {
        500
    }
    pub fn alert_sound() -> bool {
        true
    }
    pub fn simulation_enabled() -> bool {
        true
    }
    pub fn realistic_variation() -> bool {
        true
    }
    pub fn theme() -> String {
        "dark".to_string()
    }
    pub fn graph_points() -> usize {
        50
    }
    pub fn auto_export() -> bool {
        false
    }
}
