//! Market price oracle port

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("no price data for mint: {0}")]
    NoPriceData(String),
    #[error("data parsing error: {0}")]
    Parse(String),
}

/// Values arbitrary token amounts in the account's base settlement asset
#[async_trait]
pub trait PriceOracle: Send + Sync {
    /// Value of `raw_amount` base units of `mint`, expressed in base asset
    /// units (not raw lamports)
    async fn value_in_base(&self, mint: &str, raw_amount: u64) -> Result<f64, OracleError>;
}
