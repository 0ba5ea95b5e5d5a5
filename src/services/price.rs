use async_trait::async_trait;
use serde_json::Value;

use crate::error::PartialFetchError;
use crate::types::models::PoolSnapshot;

#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// USD price of the pool's reference (quote) asset.
    async fn fetch_usd_price(&self) -> Result<f64, PartialFetchError>;
}

pub struct CoinGeckoOracle {
    http: reqwest::Client,
    url: String,
    asset_id: String,
}

impl CoinGeckoOracle {
    pub fn new(http: reqwest::Client, url: impl Into<String>, asset_id: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
            asset_id: asset_id.into(),
        }
    }
}

#[async_trait]
impl PriceOracle for CoinGeckoOracle {
    async fn fetch_usd_price(&self) -> Result<f64, PartialFetchError> {
        let response = self
            .http
            .get(&self.url)
            .query(&[("ids", self.asset_id.as_str()), ("vs_currencies", "usd")])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PartialFetchError::Status(response.status().as_u16()));
        }
        let json: Value = response.json().await?;
        tracing::debug!("Price API response: {:?}", json);
        parse_usd_price(&json, &self.asset_id)
    }
}

fn parse_usd_price(json: &Value, asset_id: &str) -> Result<f64, PartialFetchError> {
    let price = json[asset_id]["usd"]
        .as_f64()
        .ok_or_else(|| PartialFetchError::Malformed(format!("no usd price for {}", asset_id)))?;
    if !price.is_finite() || price < 0.0 {
        return Err(PartialFetchError::Malformed(format!("bad price {}", price)));
    }
    Ok(price)
}

/// Reserve in whole units. Sub-unit precision is dropped on purpose; this is the
/// single place to change if fractional reserves ever need to count.
pub fn scale_reserve(raw: u64, decimals: u32) -> u64 {
    raw / 10u64.pow(decimals)
}

/// Implied token price: `(quote / base) * reference_price` on whole-unit reserves.
/// Returns `None` when the base side scales to zero.
pub fn derive_token_price(snapshot: &PoolSnapshot, reference_price: f64, decimals: u32) -> Option<f64> {
    let base = scale_reserve(snapshot.base_reserve, decimals);
    if base == 0 {
        return None;
    }
    let quote = scale_reserve(snapshot.quote_reserve, decimals);
    let price = (quote as f64 / base as f64) * reference_price.max(0.0);
    price.is_finite().then_some(price)
}
