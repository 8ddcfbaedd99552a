//! Pool Snapshot
//!
//! Immutable view of a DLMM pool's metrics at scan time. Produced by the
//! market-data adapter and consumed read-only by the classifier and selector.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time metrics for a single DLMM pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolSnapshot {
    /// Pool account address (base58)
    pub address: String,
    /// Pair name, e.g. "SOL-USDC"
    pub name: String,
    /// Mint address of token X
    pub mint_x: String,
    /// Mint address of token Y
    pub mint_y: String,
    /// Price step per bin in basis points
    pub bin_step: u16,
    /// Current pool price (Y per X)
    pub price: f64,
    /// Total value locked in USD
    pub liquidity_usd: f64,
    /// Trade volume over the last hour (USD)
    pub volume_1h: f64,
    /// Hourly volume rate measured over the last 30 minutes
    pub volume_rate_30m: f64,
    /// Hourly volume rate measured over the last hour
    pub volume_rate_1h: f64,
    /// Hourly volume rate measured over the last 4 hours
    pub volume_rate_4h: f64,
    /// Price change over the last hour, percent
    pub price_change_1h_pct: f64,
    /// Price change over the last 4 hours, percent
    pub price_change_4h_pct: f64,
    /// Fees collected over the last 24 hours (USD)
    pub fees_24h: f64,
    /// Pool creation time, if the feed knows it
    pub created_at: Option<DateTime<Utc>>,
    /// On-chain holder count of the non-base token, if enriched
    pub holder_count: Option<u64>,
    /// Organic activity score in [0, 1], if enriched
    pub organic_score: Option<f64>,
}

impl PoolSnapshot {
    /// Pool age in hours relative to `now`, if creation time is known
    pub fn age_hours(&self, now: DateTime<Utc>) -> Option<f64> {
        self.created_at
            .map(|created| (now - created).num_seconds().max(0) as f64 / 3600.0)
    }

    /// 24h fee yield relative to value locked, used as a profitability
    /// density signal for ranking
    pub fn fee_tvl_ratio(&self) -> f64 {
        if self.liquidity_usd > 0.0 {
            self.fees_24h / self.liquidity_usd
        } else {
            0.0
        }
    }

    /// Price step per bin as a percentage
    pub fn bin_step_pct(&self) -> f64 {
        self.bin_step as f64 / 100.0
    }
}
