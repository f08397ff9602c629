//! Bearing Monitor CLI
//!
//! Command-line interface for the idler-roller bearing temperature monitor.

use std::path::PathBuf;

use bearing_monitor::{load_config, Config};
use clap::Parser;
use tracing::Level;

#[derive(Parser)]
#[command(name = "bearing-monitor")]
#[command(about = "Idler-roller bearing temperature monitor")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base URL of the backend (overrides config file)
    #[arg(long)]
    endpoint: Option<String>,

    /// Polling interval, e.g. "5s" (overrides config file)
    #[arg(long)]
    interval: Option<humantime::Duration>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Fetch the status once, print it as JSON and exit
    #[arg(long)]
    once: bool,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: Level,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, endpoint={:?}, interval={:?}, dashboard_port={:?}, once={}",
        args.config,
        args.endpoint,
        args.interval,
        args.dashboard_port,
        args.once
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(endpoint) = args.endpoint {
        config.endpoint.base_url = endpoint;
    }
    if let Some(interval) = args.interval {
        config.endpoint.polling_interval = interval.into();
    }
    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }

    if args.once {
        let snapshot = bearing_monitor::poll_once(&config).await?;
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    tracing::info!("Starting bearing monitor");
    bearing_monitor::run(config).await?;

    Ok(())
}
