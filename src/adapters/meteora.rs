//! Meteora DLMM API adapter
//!
//! Pool discovery and on-chain position reads over the public DLMM REST
//! API. The API reports most numeric fields as strings; parsing keeps the
//! snapshot total by mapping unparseable values to zero rather than
//! dropping the pool.
//!
//! Position creation and withdrawal need a transaction signer and report
//! Unsupported until one is wired in; live deployments pair this adapter
//! with a signing backend, simulated mode never calls them.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::domain::pool::PoolSnapshot;
use crate::ports::chain::{ChainError, LiquidityProvider, PoolState, PositionHoldings};
use crate::ports::market_data::{FeedError, PoolFeed};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct MeteoraClient {
    http: Client,
    base_url: String,
}

impl MeteoraClient {
    pub fn new(base_url: &str) -> Result<Self, FeedError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| FeedError::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn fetch_pair(&self, pool_address: &str) -> Result<PairDto, ChainError> {
        let url = format!("{}/pair/{}", self.base_url, pool_address);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ChainError::PositionNotFound(pool_address.to_string()));
        }
        response
            .json::<PairDto>()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }
}

#[async_trait]
impl PoolFeed for MeteoraClient {
    async fn fetch(
        &self,
        limit: usize,
        sort_key: &str,
        filter_tag: Option<&str>,
    ) -> Result<Vec<PoolSnapshot>, FeedError> {
        let mut url = format!(
            "{}/pair/all_with_pagination?page=0&limit={}&sort_key={}&order_by=desc",
            self.base_url, limit, sort_key
        );
        if let Some(tag) = filter_tag {
            url.push_str(&format!("&tags={}", tag));
        }

        let response: PairPage = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| FeedError::Parse(e.to_string()))?;

        Ok(response.pairs.into_iter().map(map_pair).collect())
    }
}

#[async_trait]
impl LiquidityProvider for MeteoraClient {
    async fn pool_state(&self, pool_address: &str) -> Result<PoolState, ChainError> {
        let pair = self.fetch_pair(pool_address).await?;
        Ok(PoolState {
            active_bin: pair.active_bin_id,
            price: parse_num(&pair.current_price),
            mint_x: pair.mint_x,
            mint_y: pair.mint_y,
        })
    }

    async fn create_position(
        &self,
        _pool_address: &str,
        _lower_bin: i32,
        _upper_bin: i32,
        _amount_x: u64,
        _amount_y: u64,
    ) -> Result<String, ChainError> {
        Err(ChainError::Unsupported(
            "position creation requires a transaction signer".to_string(),
        ))
    }

    async fn current_holdings(&self, position_ref: &str) -> Result<PositionHoldings, ChainError> {
        let url = format!("{}/position/{}", self.base_url, position_ref);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ChainError::PositionNotFound(position_ref.to_string()));
        }
        let dto: PositionDto = response
            .json()
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))?;
        Ok(PositionHoldings {
            amount_x: parse_num(&dto.total_x_amount) as u64,
            amount_y: parse_num(&dto.total_y_amount) as u64,
            fee_x: parse_num(&dto.fee_x) as u64,
            fee_y: parse_num(&dto.fee_y) as u64,
        })
    }

    async fn withdraw_all(&self, _position_ref: &str) -> Result<String, ChainError> {
        Err(ChainError::Unsupported(
            "withdrawal requires a transaction signer".to_string(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct PairPage {
    pairs: Vec<PairDto>,
}

/// Pair record as the DLMM API serves it. Numbers come back as strings.
#[derive(Debug, Deserialize)]
struct PairDto {
    address: String,
    name: String,
    mint_x: String,
    mint_y: String,
    bin_step: u16,
    #[serde(default)]
    active_bin_id: i32,
    #[serde(default)]
    current_price: serde_json::Value,
    #[serde(default)]
    liquidity: serde_json::Value,
    #[serde(default)]
    fees_24h: serde_json::Value,
    #[serde(default)]
    volume: VolumeWindows,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default, Deserialize)]
struct VolumeWindows {
    #[serde(default)]
    min_30: serde_json::Value,
    #[serde(default)]
    hour_1: serde_json::Value,
    #[serde(default)]
    hour_4: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct PositionDto {
    #[serde(default)]
    total_x_amount: serde_json::Value,
    #[serde(default)]
    total_y_amount: serde_json::Value,
    #[serde(default)]
    fee_x: serde_json::Value,
    #[serde(default)]
    fee_y: serde_json::Value,
}

/// Parse a numeric field that may arrive as a JSON number or a string.
/// Anything else degrades to zero.
fn parse_num(value: &serde_json::Value) -> f64 {
    match value {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn map_pair(pair: PairDto) -> PoolSnapshot {
    let vol_30m = parse_num(&pair.volume.min_30);
    let vol_1h = parse_num(&pair.volume.hour_1);
    let vol_4h = parse_num(&pair.volume.hour_4);
    let price = parse_num(&pair.current_price);

    PoolSnapshot {
        address: pair.address,
        name: pair.name,
        mint_x: pair.mint_x,
        mint_y: pair.mint_y,
        bin_step: pair.bin_step,
        price,
        liquidity_usd: parse_num(&pair.liquidity),
        volume_1h: vol_1h,
        // Windows normalized to hourly rates
        volume_rate_30m: vol_30m * 2.0,
        volume_rate_1h: vol_1h,
        volume_rate_4h: vol_4h / 4.0,
        price_change_1h_pct: 0.0,
        price_change_4h_pct: 0.0,
        fees_24h: parse_num(&pair.fees_24h),
        created_at: pair.created_at,
        holder_count: None,
        organic_score: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_client_creation() {
        let client = MeteoraClient::new("https://dlmm-api.meteora.ag/");
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url, "https://dlmm-api.meteora.ag");
    }

    #[test]
    fn test_pair_parsing_with_string_numbers() {
        let body = r#"{
            "pairs": [{
                "address": "pool111",
                "name": "WIF-SOL",
                "mint_x": "wifMint",
                "mint_y": "So11111111111111111111111111111111111111112",
                "bin_step": 25,
                "active_bin_id": 8123,
                "current_price": "0.0012",
                "liquidity": "52340.55",
                "fees_24h": 512.3,
                "volume": {
                    "min_30": "6000",
                    "hour_1": "11500.0",
                    "hour_4": 40000
                },
                "created_at": "2026-08-20T10:00:00Z"
            }]
        }"#;
        let page: PairPage = serde_json::from_str(body).unwrap();
        let snapshot = map_pair(page.pairs.into_iter().next().unwrap());

        assert_eq!(snapshot.address, "pool111");
        assert_eq!(snapshot.bin_step, 25);
        assert_relative_eq!(snapshot.price, 0.0012, epsilon = 1e-12);
        assert_relative_eq!(snapshot.liquidity_usd, 52340.55, epsilon = 1e-9);
        assert_relative_eq!(snapshot.fees_24h, 512.3, epsilon = 1e-9);
        // 30m window doubled to an hourly rate, 4h window divided
        assert_relative_eq!(snapshot.volume_rate_30m, 12000.0, epsilon = 1e-9);
        assert_relative_eq!(snapshot.volume_rate_4h, 10000.0, epsilon = 1e-9);
        assert!(snapshot.created_at.is_some());
        assert!(snapshot.holder_count.is_none());
    }

    #[test]
    fn test_pair_parsing_tolerates_missing_fields() {
        let body = r#"{
            "pairs": [{
                "address": "bare",
                "name": "X-Y",
                "mint_x": "x",
                "mint_y": "y",
                "bin_step": 10
            }]
        }"#;
        let page: PairPage = serde_json::from_str(body).unwrap();
        let snapshot = map_pair(page.pairs.into_iter().next().unwrap());
        assert_eq!(snapshot.price, 0.0);
        assert_eq!(snapshot.volume_rate_4h, 0.0);
        assert!(snapshot.created_at.is_none());
    }

    #[test]
    fn test_position_holdings_parsing() {
        let body = r#"{
            "total_x_amount": "1500000000",
            "total_y_amount": 250000000,
            "fee_x": "12000",
            "fee_y": "0"
        }"#;
        let dto: PositionDto = serde_json::from_str(body).unwrap();
        assert_eq!(parse_num(&dto.total_x_amount) as u64, 1_500_000_000);
        assert_eq!(parse_num(&dto.total_y_amount) as u64, 250_000_000);
        assert_eq!(parse_num(&dto.fee_x) as u64, 12_000);
    }

    #[tokio::test]
    async fn test_mutations_unsupported_without_signer() {
        let client = MeteoraClient::new("https://dlmm-api.meteora.ag").unwrap();
        let create = client.create_position("pool", -5, 5, 0, 0).await;
        assert!(matches!(create, Err(ChainError::Unsupported(_))));
        let withdraw = client.withdraw_all("ref").await;
        assert!(matches!(withdraw, Err(ChainError::Unsupported(_))));
    }
}
