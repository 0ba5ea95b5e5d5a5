pub mod aggregator;
pub mod chain;
pub mod distribution;
pub mod holders;
pub mod monitor;
pub mod pool;
pub mod price;
pub mod volume;
