use async_trait::async_trait;
use serde::Deserialize;

use crate::error::PartialFetchError;

#[derive(Debug, Clone, Deserialize)]
pub struct PairStats {
    #[serde(rename = "ammId", default)]
    pub amm_id: String,
    #[serde(rename = "volume24h", default)]
    pub volume_24h: Option<f64>,
}

#[async_trait]
pub trait VolumeFeed: Send + Sync {
    /// Statistics for every pair the service knows about; filtering is client side.
    async fn fetch_pairs(&self) -> Result<Vec<PairStats>, PartialFetchError>;
}

pub struct RaydiumPairsFeed {
    http: reqwest::Client,
    url: String,
}

impl RaydiumPairsFeed {
    pub fn new(http: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[async_trait]
impl VolumeFeed for RaydiumPairsFeed {
    async fn fetch_pairs(&self) -> Result<Vec<PairStats>, PartialFetchError> {
        let response = self.http.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(PartialFetchError::Status(response.status().as_u16()));
        }
        let pairs: Vec<PairStats> = response.json().await?;
        tracing::debug!("Pair feed returned {} entries", pairs.len());
        Ok(pairs)
    }
}

/// Hourly average of the matched pair's 24h volume (not a rolling hourly figure).
/// `None` when no pair id equals `pool_address` ignoring ASCII case.
pub fn hourly_volume(pairs: &[PairStats], pool_address: &str) -> Option<f64> {
    let pool_address = pool_address.trim();
    pairs
        .iter()
        .find(|pair| pair.amm_id.eq_ignore_ascii_case(pool_address))
        .map(|pair| {
            pair.volume_24h
                .filter(|v| v.is_finite() && *v >= 0.0)
                .unwrap_or(0.0)
                / 24.0
        })
}
