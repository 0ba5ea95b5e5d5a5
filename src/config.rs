use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";
pub const DEFAULT_HOLDERS_URL: &str = "https://public-api.solscan.io/token/holders";
pub const DEFAULT_PAIRS_URL: &str = "https://api.raydium.io/v2/main/pairs";

/// Largest exponent for which 10^n still fits in a u64.
const MAX_RESERVE_DECIMALS: u32 = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HolderSource {
    Solscan,
    Rpc,
}

impl FromStr for HolderSource {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "solscan" => Ok(HolderSource::Solscan),
            "rpc" => Ok(HolderSource::Rpc),
            _ => Err(()),
        }
    }
}

/// Process-wide settings, read once at startup and passed down explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub default_pool_address: Option<String>,
    pub price_url: String,
    pub price_asset_id: String,
    pub holders_url: String,
    pub holder_source: HolderSource,
    pub holder_limit: usize,
    pub pairs_url: String,
    pub reserve_decimals: u32,
    pub watch_interval: Duration,
    pub http_timeout: Duration,
    pub rpc_timeout: Duration,
    pub rpc_requests_per_second: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            default_pool_address: None,
            price_url: DEFAULT_PRICE_URL.to_string(),
            price_asset_id: "solana".to_string(),
            holders_url: DEFAULT_HOLDERS_URL.to_string(),
            holder_source: HolderSource::Solscan,
            holder_limit: 100,
            pairs_url: DEFAULT_PAIRS_URL.to_string(),
            reserve_decimals: 9,
            watch_interval: Duration::from_secs(30),
            http_timeout: Duration::from_secs(10),
            rpc_timeout: Duration::from_secs(30),
            rpc_requests_per_second: 5,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Config::default();

        if let Some(url) = get("SOLANA_RPC_URL") {
            config.rpc_url = url;
        }
        config.default_pool_address = get("RAYDIUM_POOL_ADDRESS").map(|v| v.trim().to_string());
        if let Some(url) = get("PRICE_URL") {
            config.price_url = url;
        }
        if let Some(asset) = get("PRICE_ASSET_ID") {
            config.price_asset_id = asset;
        }
        if let Some(url) = get("HOLDERS_URL") {
            config.holders_url = url;
        }
        if let Some(url) = get("PAIRS_URL") {
            config.pairs_url = url;
        }
        if let Some(source) = get("HOLDER_SOURCE") {
            config.holder_source = source.parse().map_err(|_| ConfigError::InvalidValue {
                key: "HOLDER_SOURCE",
                value: source.clone(),
            })?;
        }
        if let Some(limit) = parse_key::<usize>(&get, "HOLDER_LIMIT")? {
            if limit == 0 {
                return Err(invalid("HOLDER_LIMIT", limit));
            }
            config.holder_limit = limit;
        }
        if let Some(decimals) = parse_key::<u32>(&get, "RESERVE_DECIMALS")? {
            if decimals > MAX_RESERVE_DECIMALS {
                return Err(invalid("RESERVE_DECIMALS", decimals));
            }
            config.reserve_decimals = decimals;
        }
        if let Some(secs) = parse_key::<u64>(&get, "WATCH_INTERVAL_SECS")? {
            config.watch_interval = positive_secs("WATCH_INTERVAL_SECS", secs)?;
        }
        if let Some(secs) = parse_key::<u64>(&get, "HTTP_TIMEOUT_SECS")? {
            config.http_timeout = positive_secs("HTTP_TIMEOUT_SECS", secs)?;
        }
        if let Some(secs) = parse_key::<u64>(&get, "RPC_TIMEOUT_SECS")? {
            config.rpc_timeout = positive_secs("RPC_TIMEOUT_SECS", secs)?;
        }
        if let Some(rps) = parse_key::<u32>(&get, "RPC_REQUESTS_PER_SECOND")? {
            if rps == 0 {
                return Err(invalid("RPC_REQUESTS_PER_SECOND", rps));
            }
            config.rpc_requests_per_second = rps;
        }

        Ok(config)
    }

    /// Picks the pool to track: explicit flag, then positional argument, then env default.
    pub fn resolve_pool_address(
        &self,
        flag: Option<&str>,
        positional: Option<&str>,
    ) -> Result<String, ConfigError> {
        flag.or(positional)
            .or(self.default_pool_address.as_deref())
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
            .map(str::to_string)
            .ok_or(ConfigError::MissingPoolAddress)
    }

    pub fn set_watch_interval_secs(&mut self, secs: u64) -> Result<(), ConfigError> {
        self.watch_interval = positive_secs("--interval", secs)?;
        Ok(())
    }
}

fn parse_key<T: FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        None => Ok(None),
    }
}

fn positive_secs(key: &'static str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(invalid(key, secs));
    }
    Ok(Duration::from_secs(secs))
}

fn invalid(key: &'static str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    }
}
