use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no pool address supplied (use --pool or set RAYDIUM_POOL_ADDRESS)")]
    MissingPoolAddress,
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Failures reading the pool itself. These abort the aggregation.
#[derive(Error, Debug)]
pub enum FatalFetchError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    #[error("pool account not found: {0}")]
    AccountNotFound(String),
    #[error("could not decode pool account: {0}")]
    Decode(String),
    #[error("rpc error: {0}")]
    Rpc(String),
}

/// Failures of the optional data sources. Swallowed by the aggregator.
#[derive(Error, Debug)]
pub enum PartialFetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("rpc error: {0}")]
    Rpc(String),
}

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("fatal fetch error: {0}")]
    FatalFetch(#[from] FatalFetchError),
}
