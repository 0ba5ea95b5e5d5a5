use std::str::FromStr;
use std::sync::Arc;

use solana_sdk::pubkey::Pubkey;

use crate::error::FatalFetchError;
use crate::services::chain::ChainClient;
use crate::types::models::PoolSnapshot;

/// Size of a Raydium AMM v4 liquidity-state account.
pub const AMM_V4_LEN: usize = 752;

const BASE_DECIMAL: usize = 32;
const QUOTE_DECIMAL: usize = 40;
const BASE_NEED_TAKE_PNL: usize = 192;
const QUOTE_NEED_TAKE_PNL: usize = 200;
const BASE_VAULT: usize = 336;
const QUOTE_VAULT: usize = 368;
const BASE_MINT: usize = 400;
const QUOTE_MINT: usize = 432;

/// The fields of the AMM v4 liquidity state that price and identity depend on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmmV4State {
    pub base_decimal: u64,
    pub quote_decimal: u64,
    pub base_need_take_pnl: u64,
    pub quote_need_take_pnl: u64,
    pub base_vault: Pubkey,
    pub quote_vault: Pubkey,
    pub base_mint: Pubkey,
    pub quote_mint: Pubkey,
}

impl AmmV4State {
    pub fn decode(data: &[u8]) -> Result<Self, FatalFetchError> {
        if data.len() < AMM_V4_LEN {
            return Err(FatalFetchError::Decode(format!(
                "AMM account too short: {} bytes (expected {})",
                data.len(),
                AMM_V4_LEN
            )));
        }

        let state = Self {
            base_decimal: read_u64(data, BASE_DECIMAL),
            quote_decimal: read_u64(data, QUOTE_DECIMAL),
            base_need_take_pnl: read_u64(data, BASE_NEED_TAKE_PNL),
            quote_need_take_pnl: read_u64(data, QUOTE_NEED_TAKE_PNL),
            base_vault: read_pubkey(data, BASE_VAULT),
            quote_vault: read_pubkey(data, QUOTE_VAULT),
            base_mint: read_pubkey(data, BASE_MINT),
            quote_mint: read_pubkey(data, QUOTE_MINT),
        };

        let unset = Pubkey::default();
        if [state.base_vault, state.quote_vault, state.base_mint, state.quote_mint].contains(&unset) {
            return Err(FatalFetchError::Decode(
                "null pubkey in AMM vault or mint fields".to_string(),
            ));
        }

        Ok(state)
    }
}

// Callers check the total length first, so slicing cannot go out of bounds.
fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&data[offset..offset + 8]);
    u64::from_le_bytes(bytes)
}

fn read_pubkey(data: &[u8], offset: usize) -> Pubkey {
    let mut bytes = [0u8; 32];
    bytes.copy_from_slice(&data[offset..offset + 32]);
    Pubkey::new_from_array(bytes)
}

/// Reads the pool account and its vault balances into a [`PoolSnapshot`].
/// Any failure here is fatal for the aggregation; there are no retries.
pub struct PoolStateReader {
    chain: Arc<dyn ChainClient>,
}

impl PoolStateReader {
    pub fn new(chain: Arc<dyn ChainClient>) -> Self {
        Self { chain }
    }

    pub async fn read(&self, pool_address: &str) -> Result<PoolSnapshot, FatalFetchError> {
        let pool_pubkey = Pubkey::from_str(pool_address.trim())
            .map_err(|_| FatalFetchError::InvalidAddress(pool_address.to_string()))?;

        let data = self
            .chain
            .account_data(&pool_pubkey)
            .await
            .map_err(FatalFetchError::Rpc)?
            .ok_or_else(|| FatalFetchError::AccountNotFound(pool_address.to_string()))?;

        let state = AmmV4State::decode(&data)?;
        tracing::debug!(
            "Decoded AMM v4 pool {}: base_decimal={} quote_decimal={}",
            pool_address,
            state.base_decimal,
            state.quote_decimal
        );

        let (base_balance, quote_balance) = futures::try_join!(
            self.chain.token_balance(&state.base_vault),
            self.chain.token_balance(&state.quote_vault),
        )
        .map_err(FatalFetchError::Rpc)?;

        Ok(PoolSnapshot {
            base_mint: state.base_mint.to_string(),
            quote_mint: state.quote_mint.to_string(),
            base_reserve: base_balance.saturating_sub(state.base_need_take_pnl),
            quote_reserve: quote_balance.saturating_sub(state.quote_need_take_pnl),
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;

    pub(crate) struct FakeChain {
        pub accounts: HashMap<Pubkey, Vec<u8>>,
        pub balances: HashMap<Pubkey, u64>,
    }

    #[async_trait]
    impl ChainClient for FakeChain {
        async fn account_data(&self, address: &Pubkey) -> Result<Option<Vec<u8>>, String> {
            Ok(self.accounts.get(address).cloned())
        }

        async fn token_balance(&self, token_account: &Pubkey) -> Result<u64, String> {
            self.balances
                .get(token_account)
                .copied()
                .ok_or_else(|| format!("no balance for {}", token_account))
        }
    }

    pub(crate) struct PoolFixture {
        pub pool: Pubkey,
        pub base_mint: Pubkey,
        pub quote_mint: Pubkey,
        pub chain: FakeChain,
    }

    pub(crate) fn encode_amm(state: &AmmV4State) -> Vec<u8> {
        let mut data = vec![0u8; AMM_V4_LEN];
        let mut put_u64 = |offset: usize, value: u64| {
            data[offset..offset + 8].copy_from_slice(&value.to_le_bytes());
        };
        put_u64(BASE_DECIMAL, state.base_decimal);
        put_u64(QUOTE_DECIMAL, state.quote_decimal);
        put_u64(BASE_NEED_TAKE_PNL, state.base_need_take_pnl);
        put_u64(QUOTE_NEED_TAKE_PNL, state.quote_need_take_pnl);
        for (offset, key) in [
            (BASE_VAULT, state.base_vault),
            (QUOTE_VAULT, state.quote_vault),
            (BASE_MINT, state.base_mint),
            (QUOTE_MINT, state.quote_mint),
        ] {
            data[offset..offset + 32].copy_from_slice(key.as_ref());
        }
        data
    }

    /// A pool whose vaults hold exactly the given reserves.
    pub(crate) fn pool_fixture(base_reserve: u64, quote_reserve: u64) -> PoolFixture {
        let state = AmmV4State {
            base_decimal: 9,
            quote_decimal: 9,
            base_need_take_pnl: 0,
            quote_need_take_pnl: 0,
            base_vault: Pubkey::new_unique(),
            quote_vault: Pubkey::new_unique(),
            base_mint: Pubkey::new_unique(),
            quote_mint: Pubkey::new_unique(),
        };
        let pool = Pubkey::new_unique();
        let chain = FakeChain {
            accounts: HashMap::from([(pool, encode_amm(&state))]),
            balances: HashMap::from([
                (state.base_vault, base_reserve),
                (state.quote_vault, quote_reserve),
            ]),
        };
        PoolFixture {
            pool,
            base_mint: state.base_mint,
            quote_mint: state.quote_mint,
            chain,
        }
    }

    #[test]
    fn decodes_layout_fields() {
        let state = AmmV4State {
            base_decimal: 6,
            quote_decimal: 9,
            base_need_take_pnl: 11,
            quote_need_take_pnl: 22,
            base_vault: Pubkey::new_unique(),
            quote_vault: Pubkey::new_unique(),
            base_mint: Pubkey::new_unique(),
            quote_mint: Pubkey::new_unique(),
        };
        assert_eq!(AmmV4State::decode(&encode_amm(&state)).unwrap(), state);
    }

    #[test]
    fn short_or_empty_layout_is_a_decode_error() {
        assert!(matches!(
            AmmV4State::decode(&[0u8; 300]),
            Err(FatalFetchError::Decode(_))
        ));
        assert!(matches!(
            AmmV4State::decode(&[0u8; AMM_V4_LEN]),
            Err(FatalFetchError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn reads_snapshot_net_of_pending_pnl() {
        let fixture = pool_fixture(2_000_000_000_000, 10_000_000_000_000);
        let mut chain = fixture.chain;
        let data = chain.accounts.get_mut(&fixture.pool).unwrap();
        data[BASE_NEED_TAKE_PNL..BASE_NEED_TAKE_PNL + 8].copy_from_slice(&5u64.to_le_bytes());

        let reader = PoolStateReader::new(Arc::new(chain));
        let snapshot = reader.read(&fixture.pool.to_string()).await.unwrap();

        assert_eq!(snapshot.base_mint, fixture.base_mint.to_string());
        assert_eq!(snapshot.quote_mint, fixture.quote_mint.to_string());
        assert_eq!(snapshot.base_reserve, 2_000_000_000_000 - 5);
        assert_eq!(snapshot.quote_reserve, 10_000_000_000_000);
    }

    #[tokio::test]
    async fn rejects_malformed_address() {
        let fixture = pool_fixture(1, 1);
        let reader = PoolStateReader::new(Arc::new(fixture.chain));
        let err = reader.read("not-a-pubkey").await.unwrap_err();
        assert!(matches!(err, FatalFetchError::InvalidAddress(_)));
    }

    #[tokio::test]
    async fn missing_account_is_not_found() {
        let fixture = pool_fixture(1, 1);
        let reader = PoolStateReader::new(Arc::new(fixture.chain));
        let err = reader.read(&Pubkey::new_unique().to_string()).await.unwrap_err();
        assert!(matches!(err, FatalFetchError::AccountNotFound(_)));
    }

    #[tokio::test]
    async fn vault_balance_failure_is_fatal() {
        let fixture = pool_fixture(1, 1);
        let mut chain = fixture.chain;
        chain.balances.clear();
        let reader = PoolStateReader::new(Arc::new(chain));
        let err = reader.read(&fixture.pool.to_string()).await.unwrap_err();
        assert!(matches!(err, FatalFetchError::Rpc(_)));
    }
}
