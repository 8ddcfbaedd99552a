//! On-chain liquidity provider port

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("position not found: {0}")]
    PositionNotFound(String),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// Live pool state needed to resolve entry ranges and sanity-check prices
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolState {
    pub active_bin: i32,
    /// Pool internal price (Y per X)
    pub price: f64,
    pub mint_x: String,
    pub mint_y: String,
}

/// Current on-chain holdings of a position: deposited amounts plus
/// unclaimed fees, in raw base units per side
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionHoldings {
    pub amount_x: u64,
    pub amount_y: u64,
    pub fee_x: u64,
    pub fee_y: u64,
}

/// Creates, inspects, and unwinds DLMM positions
#[async_trait]
pub trait LiquidityProvider: Send + Sync {
    async fn pool_state(&self, pool_address: &str) -> Result<PoolState, ChainError>;

    /// Provision liquidity across [lower_bin, upper_bin]. Returns the
    /// on-chain position reference.
    async fn create_position(
        &self,
        pool_address: &str,
        lower_bin: i32,
        upper_bin: i32,
        amount_x: u64,
        amount_y: u64,
    ) -> Result<String, ChainError>;

    async fn current_holdings(&self, position_ref: &str)
        -> Result<PositionHoldings, ChainError>;

    /// Withdraw all liquidity and claimed fees. Returns the transaction
    /// reference.
    async fn withdraw_all(&self, position_ref: &str) -> Result<String, ChainError>;
}
