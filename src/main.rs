//! SoleGuard - smart insole monitoring daemon
//!
//! # Usage
//!
//! ```bash
//! # Simulation only (default when no source is given)
//! cargo run --release
//!
//! # Acquire from a wireless-link bridge (e.g. the device-sim binary)
//! cargo run --release -- --link 127.0.0.1:9000
//!
//! # Poll a cloud dashboard
//! cargo run --release -- --dashboard https://dash.example.com/api --token <TOKEN>
//!
//! # One-shot exports
//! cargo run --release -- --export
//! cargo run --release -- --report
//! ```
//!
//! # Environment Variables
//!
//! - `SOLEGUARD_CONFIG`: path to the TOML config file
//! - `RUST_LOG`: logging level (default: info)

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use soleguard::acquisition::{DashboardClient, LinkClient};
use soleguard::config::AppConfig;
use soleguard::sim::SyntheticGenerator;
use soleguard::store::{export, CsvLog, KnownDevices};
use soleguard::worker::{Consumer, MonitorChannels, SimulationWorker, SourceSupervisor};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "soleguard")]
#[command(about = "Smart insole monitoring engine")]
#[command(version)]
struct CliArgs {
    /// Acquire readings from a wireless-link bridge at HOST:PORT
    #[arg(long, value_name = "HOST:PORT")]
    link: Option<String>,

    /// Poll a remote dashboard at this base URL (requires --token)
    #[arg(long, value_name = "URL")]
    dashboard: Option<String>,

    /// Dashboard API token
    #[arg(long, value_name = "TOKEN", requires = "dashboard")]
    token: Option<String>,

    /// Force synthetic generation even if disabled in the config
    #[arg(long)]
    simulate: bool,

    /// Path to the TOML config file
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Path to the reading log
    #[arg(long, value_name = "PATH", default_value = "insole_data.csv")]
    data: PathBuf,

    /// Path to the known-devices registry
    #[arg(long, value_name = "PATH", default_value = "known_devices.json")]
    devices: PathBuf,

    /// Write a timestamped copy of the reading log and exit
    #[arg(long)]
    export: bool,

    /// Write a clinician report (summary + patterns + data) and exit
    #[arg(long)]
    report: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let (mut config, config_path) = AppConfig::load_or_default(args.config.as_deref());
    info!(path = %config_path.display(), "Configuration resolved");

    if args.simulate {
        config.simulation.enabled = true;
    }

    let log = CsvLog::open(&args.data)
        .with_context(|| format!("Cannot open reading log at {}", args.data.display()))?;

    // One-shot export modes
    if args.export || args.report {
        let now = chrono::Utc::now();
        let dir = std::env::current_dir().context("Cannot resolve working directory")?;
        if args.export {
            let path = export::export_raw(&log, &dir, now)?;
            info!(path = %path.display(), "Export written");
        }
        if args.report {
            let path = export::export_report(&log, &config.monitoring, &dir, now)?;
            info!(path = %path.display(), "Report written");
        }
        return Ok(());
    }

    info!("SoleGuard monitoring engine starting");
    info!(
        temp = config.monitoring.temperature_threshold,
        humidity = config.monitoring.humidity_threshold,
        pressure = config.monitoring.pressure_threshold,
        interval_secs = config.monitoring.update_interval,
        "Alert thresholds"
    );

    let channels = MonitorChannels::new();
    let cancel_token = CancellationToken::new();
    let mut workers = JoinSet::new();

    // Live source supervisor
    let live_source = args.link.is_some() || args.dashboard.is_some();
    if let Some(ref addr) = args.link {
        let (host, port) = parse_host_port(addr)?;
        let registry = KnownDevices::open(&args.devices)
            .with_context(|| format!("Cannot open device registry at {}", args.devices.display()))?;
        let supervisor = SourceSupervisor::new(
            LinkClient::new(&host, port),
            config.bluetooth.clone(),
            config.monitoring.update_interval,
            channels.events_tx.clone(),
            channels.link_state_tx,
            cancel_token.clone(),
        )
        .with_registry(registry);
        workers.spawn(supervisor.run());
    } else if let Some(ref url) = args.dashboard {
        let token = args
            .token
            .as_deref()
            .context("--dashboard requires --token")?;
        let client = DashboardClient::new(url, token)
            .map_err(|e| anyhow::anyhow!("Cannot build dashboard client: {e}"))?;
        let supervisor = SourceSupervisor::new(
            client,
            config.bluetooth.clone(),
            config.monitoring.update_interval,
            channels.events_tx.clone(),
            channels.link_state_tx,
            cancel_token.clone(),
        );
        workers.spawn(supervisor.run());
    }

    // Synthetic fallback
    if config.simulation.enabled {
        let generator = SyntheticGenerator::new(&config.simulation, &config.monitoring);
        let worker = SimulationWorker::new(
            generator,
            config.monitoring.update_interval,
            channels.events_tx.clone(),
            channels.link_state_rx.clone(),
            cancel_token.clone(),
        );
        workers.spawn(worker.run());
    } else if !live_source {
        bail!("No source configured: pass --link or --dashboard, or enable simulation");
    }

    // Producers hold clones; drop ours so the consumer sees channel close
    // if every worker exits on its own.
    drop(channels.events_tx);

    // Graceful shutdown via Ctrl+C
    let shutdown_token = cancel_token.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received Ctrl+C, initiating shutdown");
        shutdown_token.cancel();
    });

    let consumer = Consumer::new(config, log, channels.events_rx, cancel_token.clone());
    let final_state = consumer.run().await;

    cancel_token.cancel();
    while let Some(res) = workers.join_next().await {
        if let Err(e) = res {
            warn!(error = %e, "Worker task failed");
        }
    }

    info!(
        readings = final_state.readings_processed,
        alerts = final_state.alerts_raised,
        "SoleGuard shutdown complete"
    );
    Ok(())
}

/// Split a `HOST:PORT` argument.
fn parse_host_port(addr: &str) -> Result<(String, u16)> {
    let (host, port) = addr
        .rsplit_once(':')
        .with_context(|| format!("Invalid address '{addr}', expected HOST:PORT"))?;
    let port: u16 = port
        .parse()
        .with_context(|| format!("Invalid port in '{addr}'"))?;
    Ok((host.to_string(), port))
}
