use std::num::NonZeroU32;
use std::sync::Arc;

use async_trait::async_trait;
use governor::{clock::DefaultClock, state::{InMemoryState, NotKeyed}, Quota, RateLimiter};
use nonzero_ext::nonzero;
use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    nonblocking::rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig},
    rpc_filter::{Memcmp, MemcmpEncodedBytes, RpcFilterType},
};
use solana_sdk::{commitment_config::CommitmentConfig, program_pack::Pack, pubkey::Pubkey};
use spl_token::state::Account as TokenAccount;

use crate::config::Config;

pub type RpcRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// The chain reads the pool reader needs. Errors are reported as plain strings
/// because callers only log them or wrap them in their own error type.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Raw account data, or `None` if the account does not exist.
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, String>;

    /// Raw (unscaled) balance of an SPL token account.
    async fn token_balance(&self, token_account: &Pubkey) -> Result<u64, String>;
}

pub struct RpcChainClient {
    client: Arc<RpcClient>,
    rate_limiter: Arc<RpcRateLimiter>,
}

impl RpcChainClient {
    pub fn new(config: &Config) -> Self {
        let rps = NonZeroU32::new(config.rpc_requests_per_second).unwrap_or(nonzero!(5u32));
        let client = RpcClient::new_with_timeout_and_commitment(
            config.rpc_url.clone(),
            config.rpc_timeout,
            CommitmentConfig::confirmed(),
        );
        Self {
            client: Arc::new(client),
            rate_limiter: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        }
    }

    /// Every initialized token account of `mint` with a balance above zero,
    /// as `(owner, raw amount)` pairs in no particular order.
    pub async fn token_accounts_by_mint(&self, mint: &Pubkey) -> Result<Vec<(Pubkey, u64)>, String> {
        let config = RpcProgramAccountsConfig {
            filters: Some(vec![
                RpcFilterType::Memcmp(Memcmp::new(
                    0,
                    MemcmpEncodedBytes::Base58(mint.to_string()),
                )),
                RpcFilterType::DataSize(TokenAccount::LEN as u64),
            ]),
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                ..Default::default()
            },
            with_context: None,
        };

        self.rate_limiter.until_ready().await;
        let accounts = self
            .client
            .get_program_accounts_with_config(&spl_token::ID, config)
            .await
            .map_err(|e| e.to_string())?;
        tracing::info!("Found {} token accounts for mint {}", accounts.len(), mint);

        Ok(decode_token_accounts(accounts.into_iter().map(|(_, account)| account.data).collect()))
    }
}

/// Unpacks SPL token accounts in parallel, keeping initialized non-empty ones.
fn decode_token_accounts(raw: Vec<Vec<u8>>) -> Vec<(Pubkey, u64)> {
    use rayon::prelude::*;

    raw.into_par_iter()
        .filter_map(|data| {
            TokenAccount::unpack(&data)
                .ok()
                .filter(|token_account| {
                    token_account.amount > 0
                        && token_account.state == spl_token::state::AccountState::Initialized
                })
                .map(|token_account| (token_account.owner, token_account.amount))
        })
        .collect()
}

#[async_trait]
impl ChainClient for RpcChainClient {
    async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, String> {
        self.rate_limiter.until_ready().await;
        let response = self
            .client
            .get_account_with_commitment(address, self.client.commitment())
            .await
            .map_err(|e| e.to_string())?;
        Ok(response.value.map(|account| account.data))
    }

    async fn token_balance(&self, token_account: &Pubkey) -> Result<u64, String> {
        self.rate_limiter.until_ready().await;
        let balance = self
            .client
            .get_token_account_balance(token_account)
            .await
            .map_err(|e| e.to_string())?;
        balance
            .amount
            .parse::<u64>()
            .map_err(|e| format!("bad token amount {:?}: {}", balance.amount, e))
    }
}
