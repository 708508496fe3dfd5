//! vmm-bot entry point.
//!
//! Loads configuration, starts the trader service against the paper venue
//! and runs until Ctrl-C or SIGTERM.

use anyhow::Result;
use clap::Parser;
use tracing::info;
use vmm_bot::{build_paper_gateway, AppConfig, TraderService};

/// Two-sided quoting bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via VMM_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    vmm_telemetry::init_logging()?;

    info!("Starting vmm-bot v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > VMM_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("VMM_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = AppConfig::load(&config_path)?;
    info!(
        service = %config.service_name,
        symbol = %config.trade.symbol,
        "Configuration loaded"
    );

    let gateway = build_paper_gateway(&config.gateway);
    let service = TraderService::new(&config, gateway.clone(), gateway)?;
    service.start()?;

    wait_for_shutdown_signal().await?;
    info!("Shutdown signal received");

    service.shutdown(config.graceful_shutdown()).await?;

    if let Ok(metrics) = vmm_telemetry::Metrics::gather_text() {
        info!(metrics = %metrics, "Final metrics");
    }
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result,
        _ = terminate.recv() => Ok(()),
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}
