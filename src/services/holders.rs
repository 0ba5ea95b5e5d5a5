use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de, Deserialize, Deserializer};
use serde_json::Value;
use solana_sdk::pubkey::Pubkey;

use crate::error::PartialFetchError;
use crate::services::chain::RpcChainClient;
use crate::types::models::{HolderPage, HolderRecord};

#[async_trait]
pub trait HolderLedger: Send + Sync {
    async fn fetch_holders(&self, mint_address: &str) -> Result<HolderPage, PartialFetchError>;
}

#[derive(Debug, Deserialize)]
struct SolscanHoldersResponse {
    data: Option<Vec<SolscanHolder>>,
    #[serde(default)]
    total: u64,
}

#[derive(Debug, Deserialize)]
struct SolscanHolder {
    owner: String,
    #[serde(deserialize_with = "raw_amount")]
    amount: u64,
}

/// Holder amounts arrive as integers, floats or decimal strings depending on size.
fn raw_amount<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|v| v.is_finite() && *v >= 0.0).map(|v| v as u64))
            .ok_or_else(|| de::Error::custom(format!("invalid amount {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<u64>()
            .or_else(|_| {
                s.trim()
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .map(|v| v as u64)
                    .ok_or(())
            })
            .map_err(|_| de::Error::custom(format!("invalid amount {:?}", s))),
        other => Err(de::Error::custom(format!("invalid amount {}", other))),
    }
}

fn parse_solscan_body(body: &str) -> Result<HolderPage, PartialFetchError> {
    let response: SolscanHoldersResponse =
        serde_json::from_str(body).map_err(|e| PartialFetchError::Malformed(e.to_string()))?;
    let holders = response
        .data
        .ok_or_else(|| PartialFetchError::Malformed("holder response has no data".to_string()))?;

    Ok(HolderPage {
        holders: holders
            .into_iter()
            .map(|h| HolderRecord {
                owner: h.owner,
                amount: h.amount,
            })
            .collect(),
        total: response.total,
    })
}

/// Holder ranking from the Solscan public token-holders endpoint.
pub struct SolscanLedger {
    http: reqwest::Client,
    url: String,
    limit: usize,
}

impl SolscanLedger {
    pub fn new(http: reqwest::Client, url: impl Into<String>, limit: usize) -> Self {
        Self {
            http,
            url: url.into(),
            limit,
        }
    }
}

#[async_trait]
impl HolderLedger for SolscanLedger {
    async fn fetch_holders(&self, mint_address: &str) -> Result<HolderPage, PartialFetchError> {
        let limit = self.limit.to_string();
        let response = self
            .http
            .get(&self.url)
            .query(&[
                ("tokenAddress", mint_address),
                ("offset", "0"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PartialFetchError::Status(response.status().as_u16()));
        }
        let body = response.text().await?;
        parse_solscan_body(&body)
    }
}

/// Holder ranking computed directly from on-chain token accounts.
pub struct RpcHolderLedger {
    chain: Arc<RpcChainClient>,
    limit: usize,
}

impl RpcHolderLedger {
    pub fn new(chain: Arc<RpcChainClient>, limit: usize) -> Self {
        Self { chain, limit }
    }
}

#[async_trait]
impl HolderLedger for RpcHolderLedger {
    async fn fetch_holders(&self, mint_address: &str) -> Result<HolderPage, PartialFetchError> {
        let mint = Pubkey::from_str(mint_address)
            .map_err(|_| PartialFetchError::Malformed(format!("bad mint {}", mint_address)))?;
        let accounts = self
            .chain
            .token_accounts_by_mint(&mint)
            .await
            .map_err(PartialFetchError::Rpc)?;
        Ok(rank_by_owner(accounts, self.limit))
    }
}

/// Sums balances per owner and ranks owners largest first. `total` counts every
/// distinct owner, even those cut by `limit`.
fn rank_by_owner(accounts: Vec<(Pubkey, u64)>, limit: usize) -> HolderPage {
    let mut by_owner: HashMap<Pubkey, u64> = HashMap::new();
    for (owner, amount) in accounts {
        let entry = by_owner.entry(owner).or_default();
        *entry = entry.saturating_add(amount);
    }
    let total = by_owner.len() as u64;
    tracing::info!("Found {} unique owners", total);

    let mut ranked: Vec<(Pubkey, u64)> = by_owner.into_iter().collect();
    // Owner key breaks ties so the ranking is deterministic.
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);

    HolderPage {
        holders: ranked
            .into_iter()
            .map(|(owner, amount)| HolderRecord {
                owner: owner.to_string(),
                amount,
            })
            .collect(),
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_amount_encodings() {
        let body = r#"{
            "data": [
                {"address": "acc1", "amount": 500, "decimals": 9, "owner": "ownerA", "rank": 1},
                {"address": "acc2", "amount": 3.0e2, "decimals": 9, "owner": "ownerB", "rank": 2},
                {"address": "acc3", "amount": "200", "decimals": 9, "owner": "ownerC", "rank": 3}
            ],
            "total": 4521
        }"#;
        let page = parse_solscan_body(body).unwrap();
        assert_eq!(page.total, 4521);
        let amounts: Vec<u64> = page.holders.iter().map(|h| h.amount).collect();
        assert_eq!(amounts, vec![500, 300, 200]);
        assert_eq!(page.holders[0].owner, "ownerA");
    }

    #[test]
    fn missing_data_is_malformed() {
        assert!(matches!(
            parse_solscan_body(r#"{"total": 3}"#),
            Err(PartialFetchError::Malformed(_))
        ));
        assert!(matches!(
            parse_solscan_body("<html>rate limited</html>"),
            Err(PartialFetchError::Malformed(_))
        ));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let body = r#"{"data": [{"owner": "x", "amount": -5}], "total": 1}"#;
        assert!(parse_solscan_body(body).is_err());
    }

    #[test]
    fn ranks_owners_by_summed_balance() {
        let whale = Pubkey::new_unique();
        let fish = Pubkey::new_unique();
        let shrimp = Pubkey::new_unique();
        let accounts = vec![(fish, 300), (whale, 400), (shrimp, 10), (whale, 200)];

        let page = rank_by_owner(accounts, 2);

        assert_eq!(page.total, 3);
        assert_eq!(
            page.holders,
            vec![
                HolderRecord { owner: whale.to_string(), amount: 600 },
                HolderRecord { owner: fish.to_string(), amount: 300 },
            ]
        );
    }
}
