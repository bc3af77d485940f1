//! Remote-dashboard poller
//!
//! Fetches each channel from its own virtual-pin endpoint
//! (`{base}get?token={token}&{pin}`, pins v0–v3). A tick succeeds only if
//! all four calls return HTTP success and parse; anything else discards the
//! whole tick with no partial update. No retry inside a tick.

use super::{AcquisitionError, ReadingSource};
use crate::types::InsoleReading;
use async_trait::async_trait;
use chrono::Utc;

/// Virtual pin per channel, fixed order:
/// temperature, humidity, heel pressure, metatarsal pressure.
const CHANNEL_PINS: [&str; 4] = ["v0", "v1", "v2", "v3"];

/// Per-request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// HTTP client polling a cloud dashboard's virtual pins.
pub struct DashboardClient {
    base_url: String,
    token: String,
    http: reqwest::Client,
    connected: bool,
    /// Total complete ticks fetched since creation
    ticks_fetched: u64,
    /// Total ticks discarded (bad status or unparseable body)
    ticks_discarded: u64,
}

impl DashboardClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, AcquisitionError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AcquisitionError::ConnectionFailed(e.to_string()))?;

        let mut base_url = base_url.to_string();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            base_url,
            token: token.to_string(),
            http,
            connected: false,
            ticks_fetched: 0,
            ticks_discarded: 0,
        })
    }

    /// (complete ticks fetched, ticks discarded)
    pub fn stats(&self) -> (u64, u64) {
        (self.ticks_fetched, self.ticks_discarded)
    }

    fn pin_url(&self, pin: &str) -> String {
        format!("{}get?token={}&{}", self.base_url, self.token, pin)
    }

    /// Fetch one pin as a scalar, stripping the wrapping `[`, `]`, `"`
    /// the dashboard puts around values.
    async fn fetch_pin(&self, pin: &str) -> Result<f64, AcquisitionError> {
        let url = self.pin_url(pin);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| AcquisitionError::ConnectionFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AcquisitionError::HttpStatus {
                endpoint: pin.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| AcquisitionError::ConnectionFailed(e.to_string()))?;
        let cleaned: String = body.chars().filter(|c| !"[]\"".contains(*c)).collect();

        cleaned
            .trim()
            .parse::<f64>()
            .map_err(|_| AcquisitionError::ParseError {
                field: "pin value",
                value: cleaned.trim().to_string(),
            })
    }
}

#[async_trait]
impl ReadingSource for DashboardClient {
    /// Probe the temperature pin to verify reachability and token validity.
    async fn connect(&mut self) -> Result<(), AcquisitionError> {
        if self.connected {
            return Ok(());
        }
        tracing::info!(url = %self.base_url, "Probing dashboard endpoint");
        self.fetch_pin(CHANNEL_PINS[0]).await?;
        self.connected = true;
        tracing::info!("Dashboard reachable");
        Ok(())
    }

    async fn disconnect(&mut self) {
        self.connected = false;
        tracing::info!("Dashboard polling stopped");
    }

    /// All-or-nothing: the first failed pin discards the whole tick.
    async fn poll_reading(&mut self) -> Result<InsoleReading, AcquisitionError> {
        if !self.connected {
            return Err(AcquisitionError::NotConnected);
        }

        let mut values = [0.0f64; 4];
        for (slot, pin) in values.iter_mut().zip(CHANNEL_PINS) {
            *slot = match self.fetch_pin(pin).await {
                Ok(v) => v,
                Err(e) => {
                    self.ticks_discarded += 1;
                    tracing::warn!(pin, error = %e, "Discarding dashboard tick");
                    return Err(e);
                }
            };
        }

        self.ticks_fetched += 1;
        Ok(InsoleReading {
            temperature: values[0],
            humidity: values[1],
            heel_pressure: values[2] as u32,
            meta_pressure: values[3] as u32,
            timestamp: Utc::now(),
        })
    }

    fn source_name(&self) -> &'static str {
        "dashboard"
    }

    fn endpoint(&self) -> String {
        self.base_url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Minimal HTTP server answering `n` requests with the given bodies
    /// (cycled), each with the given status line.
    async fn spawn_http(bodies: Vec<&'static str>, status: &'static str, n: usize) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for i in 0..n {
                let (mut stream, _) = listener.accept().await.unwrap();
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await.unwrap();
                let body = bodies[i % bodies.len()];
                let response = format!(
                    "HTTP/1.1 {status}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(response.as_bytes()).await.unwrap();
            }
        });
        format!("http://{addr}/")
    }

    #[tokio::test]
    async fn complete_tick_builds_reading_from_four_pins() {
        let base = spawn_http(
            vec!["[\"36.4\"]", "[\"52.0\"]", "[\"315\"]", "[\"270\"]"],
            "200 OK",
            5,
        )
        .await;
        let mut client = DashboardClient::new(&base, "tok").unwrap();
        client.connect().await.unwrap();

        let reading = client.poll_reading().await.unwrap();
        assert!((reading.temperature - 36.4).abs() < 1e-9);
        assert!((reading.humidity - 52.0).abs() < 1e-9);
        assert_eq!(reading.heel_pressure, 315);
        assert_eq!(reading.meta_pressure, 270);
        assert_eq!(client.stats(), (1, 0));
    }

    #[tokio::test]
    async fn non_success_status_discards_tick() {
        let base = spawn_http(vec!["nope"], "500 Internal Server Error", 2).await;
        let mut client = DashboardClient::new(&base, "tok").unwrap();
        client.connected = true;

        let err = client.poll_reading().await.unwrap_err();
        assert!(matches!(err, AcquisitionError::HttpStatus { status: 500, .. }));
        assert_eq!(client.stats(), (0, 1));
    }

    #[tokio::test]
    async fn unparseable_body_discards_tick_without_transport_error() {
        let base = spawn_http(vec!["not-a-number"], "200 OK", 2).await;
        let mut client = DashboardClient::new(&base, "tok").unwrap();
        client.connected = true;

        let err = client.poll_reading().await.unwrap_err();
        assert!(matches!(err, AcquisitionError::ParseError { .. }));
        assert!(!err.is_transport());
    }

    #[test]
    fn pin_url_carries_token_and_pin() {
        let client = DashboardClient::new("http://dash.example.com/api", "abc123").unwrap();
        assert_eq!(
            client.pin_url("v2"),
            "http://dash.example.com/api/get?token=abc123&v2"
        );
    }
}
