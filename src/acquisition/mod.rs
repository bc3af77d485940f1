//! Reading acquisition from live sources
//!
//! Two interchangeable sources produce real readings: a wireless serial
//! link client ([`link::LinkClient`]) and a remote dashboard poller
//! ([`dashboard::DashboardClient`]). Both implement [`ReadingSource`], which
//! the supervisor drives on the configured polling cadence.

use crate::types::InsoleReading;
use async_trait::async_trait;
use thiserror::Error;

pub mod dashboard;
pub mod link;

pub use dashboard::DashboardClient;
pub use link::LinkClient;

/// Acquisition errors.
///
/// Transport errors drop the connection; a malformed frame only drops the
/// current tick. [`AcquisitionError::is_transport`] makes the distinction.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Timeout waiting for data")]
    Timeout,

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Not connected")]
    NotConnected,

    #[error("Malformed frame: expected {expected} fields, got {got}")]
    MalformedFrame { expected: usize, got: usize },

    #[error("Cannot parse {field}: '{value}'")]
    ParseError { field: &'static str, value: String },

    #[error("Endpoint {endpoint} returned status {status}")]
    HttpStatus { endpoint: String, status: u16 },
}

impl AcquisitionError {
    /// Whether this error invalidates the underlying connection.
    ///
    /// Malformed or unparseable payloads do not: the tick is dropped and
    /// the next poll proceeds on the same connection.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::ConnectionFailed(_)
            | Self::Timeout
            | Self::ConnectionClosed
            | Self::NotConnected => true,
            Self::MalformedFrame { .. } | Self::ParseError { .. } | Self::HttpStatus { .. } => {
                false
            }
        }
    }
}

/// Trait abstracting where live readings come from.
///
/// Implementations handle transport and payload parsing internally. The
/// supervisor calls [`poll_reading`] once per tick inside a select! with
/// cancellation, and owns the reconnect policy.
///
/// [`poll_reading`]: ReadingSource::poll_reading
#[async_trait]
pub trait ReadingSource: Send {
    /// Establish the connection (bounded timeout inside).
    async fn connect(&mut self) -> Result<(), AcquisitionError>;

    /// Tear down the connection. Always succeeds.
    async fn disconnect(&mut self);

    /// Fetch one reading.
    async fn poll_reading(&mut self) -> Result<InsoleReading, AcquisitionError>;

    /// Human-readable name for logging (e.g. "wireless-link", "dashboard").
    fn source_name(&self) -> &'static str;

    /// Address identifying the remote peer, for the device registry.
    fn endpoint(&self) -> String;
}

/// Parse a 4-field comma-delimited sensor frame
/// (`temperature,humidity,heel,meta`) into a reading stamped `now`.
pub(crate) fn parse_frame(
    line: &str,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<InsoleReading, AcquisitionError> {
    let fields: Vec<&str> = line.trim().split(',').collect();
    if fields.len() != 4 {
        return Err(AcquisitionError::MalformedFrame {
            expected: 4,
            got: fields.len(),
        });
    }

    let num = |field: &'static str, raw: &str| -> Result<f64, AcquisitionError> {
        raw.trim()
            .parse::<f64>()
            .map_err(|_| AcquisitionError::ParseError {
                field,
                value: raw.to_string(),
            })
    };

    Ok(InsoleReading {
        temperature: num("temperature", fields[0])?,
        humidity: num("humidity", fields[1])?,
        heel_pressure: num("heel_pressure", fields[2])? as u32,
        meta_pressure: num("meta_pressure", fields[3])? as u32,
        timestamp: now,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn parses_well_formed_frame() {
        let now = Utc::now();
        let reading = parse_frame("36.5,48.2,310,275\r\n", now).unwrap();
        assert!((reading.temperature - 36.5).abs() < 1e-9);
        assert!((reading.humidity - 48.2).abs() < 1e-9);
        assert_eq!(reading.heel_pressure, 310);
        assert_eq!(reading.meta_pressure, 275);
        assert_eq!(reading.timestamp, now);
    }

    #[test]
    fn wrong_field_count_is_malformed_not_transport() {
        let err = parse_frame("36.5,48.2,310", Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            AcquisitionError::MalformedFrame { expected: 4, got: 3 }
        ));
        assert!(!err.is_transport());
    }

    #[test]
    fn non_numeric_field_is_parse_error() {
        let err = parse_frame("36.5,oops,310,275", Utc::now()).unwrap_err();
        assert!(matches!(err, AcquisitionError::ParseError { field: "humidity", .. }));
        assert!(!err.is_transport());
    }

    #[test]
    fn transport_errors_invalidate_connection() {
        assert!(AcquisitionError::Timeout.is_transport());
        assert!(AcquisitionError::ConnectionClosed.is_transport());
        assert!(AcquisitionError::ConnectionFailed("refused".into()).is_transport());
    }
}
