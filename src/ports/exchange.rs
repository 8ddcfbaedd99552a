//! Asset exchange port for converting between the base asset and pool tokens

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("API request failed: {0}")]
    Api(String),
    #[error("slippage tolerance exceeded")]
    SlippageExceeded,
    #[error("insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u64, need: u64 },
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// Result of one conversion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionReceipt {
    /// Raw output amount in the target token's base units
    pub output_amount: u64,
    /// Transaction signature or provider reference
    pub reference: String,
}

/// Swaps one asset for another through an external venue. Money-moving:
/// callers never retry these silently.
#[async_trait]
pub trait AssetExchange: Send + Sync {
    async fn convert(
        &self,
        from_mint: &str,
        to_mint: &str,
        raw_amount: u64,
        max_slippage_bps: u16,
    ) -> Result<ConversionReceipt, ExchangeError>;
}
