//! device-sim — fake insole for end-to-end testing
//!
//! Serves the wireless-link protocol over TCP: each `GET_DATA` command is
//! answered with one comma-delimited line of four sensor values produced by
//! the synthetic generator. Point the main binary at it:
//!
//! ```bash
//! cargo run --bin device-sim -- --port 9000
//! cargo run -- --link 127.0.0.1:9000
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use soleguard::config::{MonitoringConfig, SimulationConfig};
use soleguard::sim::SyntheticGenerator;
use soleguard::store::csv_log::format_row;
use soleguard::types::InsoleReading;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "device-sim", about = "Fake insole serving the wireless-link protocol")]
struct CliArgs {
    /// Bind address
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value = "9000")]
    port: u16,

    /// Sample independently around baselines instead of smooth trajectories
    #[arg(long)]
    no_variation: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Cannot bind {addr}"))?;
    info!(address = %addr, "device-sim listening");

    let sim_config = SimulationConfig {
        enabled: true,
        realistic_variation: !args.no_variation,
    };

    loop {
        let (stream, peer) = listener.accept().await.context("Accept failed")?;
        info!(peer = %peer, "Client connected");
        let sim_config = sim_config.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_client(stream, &sim_config).await {
                warn!(peer = %peer, error = %e, "Client session ended");
            } else {
                info!(peer = %peer, "Client disconnected");
            }
        });
    }
}

/// Answer GET_DATA commands until the client hangs up.
async fn serve_client(stream: TcpStream, sim_config: &SimulationConfig) -> Result<()> {
    let mut generator = SyntheticGenerator::new(sim_config, &MonitoringConfig::default());
    let mut previous: Option<InsoleReading> = None;
    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    loop {
        line.clear();
        let bytes = reader.read_line(&mut line).await?;
        if bytes == 0 {
            return Ok(());
        }

        if line.trim() != "GET_DATA" {
            warn!(command = line.trim(), "Ignoring unknown command");
            continue;
        }

        let reading = generator.next_reading(previous.as_ref(), chrono::Utc::now());
        let frame = format!(
            "{:.1},{:.1},{},{}\n",
            reading.temperature, reading.humidity, reading.heel_pressure, reading.meta_pressure
        );
        reader.get_mut().write_all(frame.as_bytes()).await?;
        tracing::debug!(frame = %format_row(&reading), "Served reading");
        previous = Some(reading);
    }
}
