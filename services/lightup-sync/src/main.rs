//! LightUp Sync CLI
//!
//! Command-line interface for the LightUpPi alarm and station sync service.

use std::path::PathBuf;

use clap::Parser;
use lightup_sync::{load_config, Config};
use tracing::Level;

#[derive(Parser)]
#[command(name = "lightup-sync")]
#[command(about = "Alarm and station synchronization service for LightUpPi")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// LightUpPi backend base URL (overrides config file)
    #[arg(long)]
    backend_url: Option<String>,

    /// Dashboard port (overrides config file)
    #[arg(long)]
    dashboard_port: Option<u16>,

    /// Periodically re-poll both collections
    #[arg(long)]
    poll: bool,

    /// Log level
    #[arg(short, long, default_value = "info", value_parser = parse_log_level)]
    log_level: Level,
}

fn parse_log_level(s: &str) -> Result<Level, String> {
    s.parse().map_err(|_| {
        format!(
            "Invalid log level: {}. Use: trace, debug, info, warn, error",
            s
        )
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .init();

    tracing::debug!(
        "Parsed command line arguments: config={:?}, backend_url={:?}, dashboard_port={:?}, poll={}, log_level={:?}",
        args.config,
        args.backend_url,
        args.dashboard_port,
        args.poll,
        args.log_level
    );

    let mut config = if let Some(config_path) = &args.config {
        tracing::debug!("Loading configuration from {:?}", config_path);
        load_config(config_path)?
    } else {
        tracing::debug!("Using default configuration");
        Config::default()
    };

    if let Some(backend_url) = args.backend_url {
        config.backend.base_url = backend_url;
    }
    if let Some(dashboard_port) = args.dashboard_port {
        config.dashboard.port = dashboard_port;
    }
    if args.poll {
        config.polling.enabled = true;
    }

    tracing::info!("Starting LightUp sync service");
    tracing::debug!(
        "Polling: {} every {:?}, dashboard: {} on port {}",
        config.polling.enabled,
        config.polling.interval(),
        config.dashboard.enabled,
        config.dashboard.port
    );

    lightup_sync::run(config).await?;

    Ok(())
}
