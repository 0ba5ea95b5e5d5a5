use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod services;
mod types;

use crate::config::{Config, HolderSource};
use crate::services::aggregator::MetricsAggregator;
use crate::services::chain::{ChainClient, RpcChainClient};
use crate::services::holders::{HolderLedger, RpcHolderLedger, SolscanLedger};
use crate::services::monitor::{RunMode, Scheduler};
use crate::services::pool::PoolStateReader;
use crate::services::price::CoinGeckoOracle;
use crate::services::volume::RaydiumPairsFeed;
use crate::types::models::TokenMetrics;

/// Emit token metrics for a Raydium liquidity pool as JSON.
#[derive(Parser, Debug)]
#[command(name = "pairwatch", version)]
struct Cli {
    /// Pool address (falls back to RAYDIUM_POOL_ADDRESS)
    pool_address: Option<String>,

    /// Pool address; takes precedence over the positional argument
    #[arg(long)]
    pool: Option<String>,

    /// Keep running and emit a record every interval
    #[arg(long)]
    watch: bool,

    /// Seconds between updates in watch mode (default WATCH_INTERVAL_SECS or 30)
    #[arg(long)]
    interval: Option<u64>,
}

fn build_aggregator(config: &Config) -> Result<MetricsAggregator> {
    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .user_agent(concat!("pairwatch/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let rpc = Arc::new(RpcChainClient::new(config));
    let ledger: Arc<dyn HolderLedger> = match config.holder_source {
        HolderSource::Solscan => Arc::new(SolscanLedger::new(
            http.clone(),
            config.holders_url.clone(),
            config.holder_limit,
        )),
        HolderSource::Rpc => Arc::new(RpcHolderLedger::new(rpc.clone(), config.holder_limit)),
    };
    let chain: Arc<dyn ChainClient> = rpc;

    Ok(MetricsAggregator::new(
        PoolStateReader::new(chain),
        Arc::new(CoinGeckoOracle::new(
            http.clone(),
            config.price_url.clone(),
            config.price_asset_id.clone(),
        )),
        ledger,
        Arc::new(RaydiumPairsFeed::new(http, config.pairs_url.clone())),
        config.reserve_decimals,
    ))
}

fn print_metrics(metrics: &TokenMetrics) {
    match serde_json::to_string_pretty(metrics) {
        Ok(json) => println!("{}", json),
        Err(e) => tracing::error!("Failed to serialize token metrics: {}", e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(secs) = cli.interval {
        config.set_watch_interval_secs(secs)?;
    }

    let pool_address = match config.resolve_pool_address(cli.pool.as_deref(), cli.pool_address.as_deref()) {
        Ok(address) => address,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("Usage: pairwatch --pool <POOL_ADDRESS> [--watch]");
            eprintln!("   or: set RAYDIUM_POOL_ADDRESS in .env and run pairwatch");
            return Err(e.into());
        }
    };
    tracing::info!("Using RPC endpoint {}", config.rpc_url);

    let aggregator = build_aggregator(&config)?;
    let mode = if cli.watch {
        tracing::info!("Watching pool {} for updates...", pool_address);
        RunMode::Every(config.watch_interval)
    } else {
        RunMode::Once
    };

    let aggregator = &aggregator;
    let pool = pool_address.as_str();
    let mut scheduler = Scheduler::new(mode);
    scheduler
        .run(
            move || aggregator.collect(pool),
            |iteration, metrics: &TokenMetrics| {
                if cli.watch {
                    tracing::info!("--- Update #{} at {} ---", iteration, chrono::Utc::now().to_rfc3339());
                }
                print_metrics(metrics);
            },
            async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for shutdown signal: {}", e);
                    std::future::pending::<()>().await;
                }
            },
        )
        .await?;

    tracing::info!("Finished after {} update(s) ({:?})", scheduler.iterations(), scheduler.state());
    Ok(())
}
