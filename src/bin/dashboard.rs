//! agvision-dashboard - interactive flower analysis in the browser
//!
//! Reads the credential from `LANDINGAI_API_KEY` (or the config's `api_key_path`)
//! and refuses to start without it.

use std::net::SocketAddr;
use std::path::PathBuf;

use agvision::dashboard::Dashboard;
use agvision::{AppConfig, DetectionClient};
use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about = "Serve the flower analysis dashboard", long_about = None)]
struct Args {
    /// Listen address (overrides config)
    #[arg(long)]
    addr: Option<SocketAddr>,

    /// TOML config file (overrides AGVISION_CONFIG)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = AppConfig::load_with(args.config.as_deref(), |key| std::env::var(key).ok())?;
    if let Some(addr) = args.addr {
        config.dashboard.addr = addr;
    }
    let api_key = config.require_api_key()?;
    log::info!("API key configured");

    let client = DetectionClient::new(config.detection.clone(), api_key)?;
    let dashboard = Dashboard::new(client, config.dashboard.clone());
    let listener = dashboard.bind().await?;
    log::info!("dashboard listening on http://{}", listener.local_addr()?);

    dashboard
        .serve(listener, async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                log::error!("failed to listen for Ctrl-C: {err}");
                std::future::pending::<()>().await;
            }
            log::info!("shutdown signal received");
        })
        .await
}
