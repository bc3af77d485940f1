//! Wireless serial-link client
//!
//! Polls the insole over a TCP-tunnelled serial link: send the fixed
//! `GET_DATA` command, read back one comma-delimited line of 4 numeric
//! fields (temperature, humidity, heel pressure, metatarsal pressure).
//! Sends retry up to 3 times per tick; reads are bounded by a 5 s timeout.

use super::{parse_frame, AcquisitionError, ReadingSource};
use crate::types::InsoleReading;
use async_trait::async_trait;
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Fixed data-request command.
const DATA_COMMAND: &[u8] = b"GET_DATA\n";

/// Connection attempt timeout.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Per-response read timeout.
const READ_TIMEOUT_SECS: u64 = 5;

/// Send attempts per tick before the connection is declared dead.
const SEND_ATTEMPTS: u32 = 3;

/// Delay between send retries.
const SEND_RETRY_DELAY_MS: u64 = 500;

/// Wireless-link TCP client with per-tick request/response polling.
pub struct LinkClient {
    host: String,
    port: u16,
    stream: Option<BufReader<TcpStream>>,
    line_buffer: String,
    /// Total readings successfully parsed since creation
    readings_received: u64,
    /// Total malformed frames dropped
    malformed_frames: u64,
    /// Total read timeouts encountered
    timeouts: u64,
}

impl LinkClient {
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            stream: None,
            line_buffer: String::with_capacity(64),
            readings_received: 0,
            malformed_frames: 0,
            timeouts: 0,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// (readings received, malformed frames dropped, read timeouts)
    pub fn stats(&self) -> (u64, u64, u64) {
        (self.readings_received, self.malformed_frames, self.timeouts)
    }

    /// Send the data command, retrying on send failure.
    async fn send_command(&mut self) -> Result<(), AcquisitionError> {
        for attempt in 1..=SEND_ATTEMPTS {
            let reader = self.stream.as_mut().ok_or(AcquisitionError::NotConnected)?;
            match reader.get_mut().write_all(DATA_COMMAND).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < SEND_ATTEMPTS => {
                    tracing::warn!(attempt, error = %e, "Send failed, retrying");
                    tokio::time::sleep(tokio::time::Duration::from_millis(SEND_RETRY_DELAY_MS))
                        .await;
                }
                Err(e) => return Err(AcquisitionError::ConnectionFailed(e.to_string())),
            }
        }
        Err(AcquisitionError::NotConnected)
    }

    /// Read one response line with timeout.
    async fn read_response(&mut self) -> Result<String, AcquisitionError> {
        let reader = self.stream.as_mut().ok_or(AcquisitionError::NotConnected)?;
        self.line_buffer.clear();

        let read_timeout = tokio::time::Duration::from_secs(READ_TIMEOUT_SECS);
        let bytes = match tokio::time::timeout(read_timeout, reader.read_line(&mut self.line_buffer))
            .await
        {
            Ok(Ok(b)) => b,
            Ok(Err(e)) => return Err(AcquisitionError::ConnectionFailed(e.to_string())),
            Err(_) => {
                self.timeouts += 1;
                return Err(AcquisitionError::Timeout);
            }
        };

        if bytes == 0 {
            return Err(AcquisitionError::ConnectionClosed);
        }
        Ok(self.line_buffer.clone())
    }
}

#[async_trait]
impl ReadingSource for LinkClient {
    async fn connect(&mut self) -> Result<(), AcquisitionError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let addr = format!("{}:{}", self.host, self.port);
        tracing::info!(address = %addr, "Connecting to insole link");

        let connect_timeout = tokio::time::Duration::from_secs(CONNECT_TIMEOUT_SECS);
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| AcquisitionError::Timeout)?
            .map_err(|e| AcquisitionError::ConnectionFailed(e.to_string()))?;

        // Enable TCP keepalive to detect dead connections
        let sock_ref = socket2::SockRef::from(&stream);
        let keepalive = socket2::TcpKeepalive::new()
            .with_time(std::time::Duration::from_secs(30))
            .with_interval(std::time::Duration::from_secs(10));
        let _ = sock_ref.set_tcp_keepalive(&keepalive);

        self.stream = Some(BufReader::new(stream));
        tracing::info!("Insole link established");
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(ref mut reader) = self.stream {
            let _ = reader.get_mut().shutdown().await;
        }
        self.stream = None;
        tracing::info!("Insole link closed");
    }

    async fn poll_reading(&mut self) -> Result<InsoleReading, AcquisitionError> {
        self.send_command().await?;
        let line = self.read_response().await?;

        match parse_frame(&line, Utc::now()) {
            Ok(reading) => {
                self.readings_received += 1;
                Ok(reading)
            }
            Err(e) => {
                self.malformed_frames += 1;
                tracing::warn!(
                    frame = line.trim(),
                    error = %e,
                    total_malformed = self.malformed_frames,
                    "Dropping malformed frame"
                );
                Err(e)
            }
        }
    }

    fn source_name(&self) -> &'static str {
        "wireless-link"
    }

    fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
