use std::sync::Arc;

use crate::error::TrackerError;
use crate::services::distribution;
use crate::services::holders::HolderLedger;
use crate::services::pool::PoolStateReader;
use crate::services::price::{derive_token_price, PriceOracle};
use crate::services::volume::{hourly_volume, VolumeFeed};
use crate::types::models::TokenMetrics;

/// Builds one [`TokenMetrics`] record per call.
///
/// The pool read is the only required step. Price, holder and volume lookups run
/// concurrently afterwards and each falls back to default fields on failure.
pub struct MetricsAggregator {
    pool_reader: PoolStateReader,
    oracle: Arc<dyn PriceOracle>,
    ledger: Arc<dyn HolderLedger>,
    volume_feed: Arc<dyn VolumeFeed>,
    reserve_decimals: u32,
}

impl MetricsAggregator {
    pub fn new(
        pool_reader: PoolStateReader,
        oracle: Arc<dyn PriceOracle>,
        ledger: Arc<dyn HolderLedger>,
        volume_feed: Arc<dyn VolumeFeed>,
        reserve_decimals: u32,
    ) -> Self {
        Self {
            pool_reader,
            oracle,
            ledger,
            volume_feed,
            reserve_decimals,
        }
    }

    pub async fn collect(&self, pool_address: &str) -> Result<TokenMetrics, TrackerError> {
        let mut metrics = TokenMetrics::for_pool(pool_address);

        tracing::info!("Fetching pool data for {}...", pool_address);
        let snapshot = self.pool_reader.read(pool_address).await.map_err(|e| {
            tracing::error!("Error fetching pool data for {}: {}", pool_address, e);
            e
        })?;
        metrics.token_address = snapshot.base_mint.clone();
        tracing::info!("Base token: {}", snapshot.base_mint);
        tracing::info!("Quote token: {}", snapshot.quote_mint);

        let (price, holders, pairs) = tokio::join!(
            self.oracle.fetch_usd_price(),
            self.ledger.fetch_holders(&snapshot.base_mint),
            self.volume_feed.fetch_pairs(),
        );

        match price {
            Ok(price) => {
                metrics.sol_price = price;
                tracing::info!("Reference price: ${}", price);
            }
            Err(e) => tracing::warn!("Could not fetch reference price: {}", e),
        }

        match derive_token_price(&snapshot, metrics.sol_price, self.reserve_decimals) {
            Some(price) => {
                metrics.token_price = price;
                tracing::info!("Calculated token price: ${}", price);
            }
            None => tracing::warn!(
                "Base reserve {} is below one whole unit, token price left at 0",
                snapshot.base_reserve
            ),
        }

        match holders {
            Ok(page) => {
                metrics.num_holders = page.total;
                let analysis = distribution::analyze(&page.holders);
                metrics.holders_distribution = analysis.distribution;
                if let Some(dev) = analysis.dev {
                    metrics.dev_address = dev.owner;
                    metrics.dev_holdings = dev.amount;
                    metrics.dev_holdings_live = dev.amount;
                }
                if let Some(amount) = analysis.creator_amount {
                    metrics.creator_holdings_live = amount;
                }
                tracing::info!(
                    "Holders: {} reported, {} ranked, top10 {:.2}%",
                    page.total,
                    page.holders.len(),
                    metrics.holders_distribution.top10
                );
            }
            Err(e) => tracing::warn!("Could not fetch holder information: {}", e),
        }

        match pairs {
            Ok(pairs) => match hourly_volume(&pairs, pool_address) {
                Some(volume) => {
                    metrics.hourly_volume = volume;
                    tracing::info!("Hourly volume: {}", volume);
                }
                None => tracing::warn!("No volume entry for pair {}", pool_address),
            },
            Err(e) => tracing::warn!("Could not fetch volume information: {}", e),
        }

        Ok(metrics)
    }
}
