use serde::{Deserialize, Serialize};

/// Decoded state of the liquidity pool at the moment it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub base_mint: String,
    pub quote_mint: String,
    pub base_reserve: u64,
    pub quote_reserve: u64,
}

/// One entry of the holder ledger. `amount` is raw, not scaled by decimals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HolderRecord {
    pub owner: String,
    pub amount: u64,
}

/// Holder ledger response: ranked holders plus the holder count the source reports.
#[derive(Debug, Clone, Default)]
pub struct HolderPage {
    pub holders: Vec<HolderRecord>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HoldersDistribution {
    pub top10: f64,
    pub top25: f64,
    pub top50: f64,
    pub top100: f64,
}

/// Normalized metrics record emitted once per aggregation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMetrics {
    pub token_address: String,
    pub main_pair_address: String,
    pub dev_address: String,
    pub dev_holdings: u64,
    pub dev_holdings_live: u64,
    pub creator_holdings_live: u64,
    pub sol_price: f64,
    pub token_price: f64,
    pub hourly_volume: f64,
    pub num_holders: u64,
    pub holders_distribution: HoldersDistribution,
}

impl TokenMetrics {
    pub fn for_pool(pool_address: &str) -> Self {
        Self {
            main_pair_address: pool_address.to_string(),
            ..Default::default()
        }
    }
}
