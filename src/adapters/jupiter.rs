//! Jupiter API adapters
//!
//! Price oracle backed by the Jupiter price API and token enrichment from
//! the Jupiter token search API. Both are read-only REST clients. The
//! exchange adapter is a placeholder until a transaction signer is wired
//! in; every conversion attempt reports Unsupported.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::ports::exchange::{AssetExchange, ConversionReceipt, ExchangeError};
use crate::ports::market_data::{EnrichmentSource, FeedError, PoolEnrichment};
use crate::ports::oracle::{OracleError, PriceOracle};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw units per whole token, assuming 9 decimals
const LAMPORTS_PER_UNIT: f64 = 1_000_000_000.0;

/// Price oracle: values any mint in base-asset units via the USD prices of
/// both legs
#[derive(Debug, Clone)]
pub struct JupiterPriceOracle {
    http: Client,
    base_url: String,
    base_mint: String,
}

impl JupiterPriceOracle {
    pub fn new(base_url: &str, base_mint: &str) -> Result<Self, OracleError> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| OracleError::Http(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            base_mint: base_mint.to_string(),
        })
    }

    async fn fetch_prices(&self, mints: &[&str]) -> Result<HashMap<String, f64>, OracleError> {
        let url = format!("{}?ids={}", self.base_url, mints.join(","));
        let response: PriceResponse = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| OracleError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| OracleError::Parse(e.to_string()))?;

        let mut prices = HashMap::new();
        for (mint, data) in response.data {
            let Some(data) = data else { continue };
            let price = data
                .price
                .parse::<f64>()
                .map_err(|e| OracleError::Parse(format!("price for {}: {}", mint, e)))?;
            prices.insert(mint, price);
        }
        Ok(prices)
    }
}

#[async_trait]
impl PriceOracle for JupiterPriceOracle {
    async fn value_in_base(&self, mint: &str, raw_amount: u64) -> Result<f64, OracleError> {
        let prices = self.fetch_prices(&[mint, &self.base_mint]).await?;
        let mint_usd = prices
            .get(mint)
            .copied()
            .ok_or_else(|| OracleError::NoPriceData(mint.to_string()))?;
        let base_usd = prices
            .get(&self.base_mint)
            .copied()
            .ok_or_else(|| OracleError::NoPriceData(self.base_mint.clone()))?;
        if base_usd <= 0.0 {
            return Err(OracleError::NoPriceData(self.base_mint.clone()));
        }
        Ok(mint_usd / base_usd * raw_amount as f64 / LAMPORTS_PER_UNIT)
    }
}

/// Price API response, price v2 shape: prices arrive as strings and
/// unknown mints map to null
#[derive(Debug, Deserialize)]
struct PriceResponse {
    data: HashMap<String, Option<PriceData>>,
}

#[derive(Debug, Deserialize)]
struct PriceData {
    price: String,
}

/// Token enrichment from the Jupiter token search API
#[derive(Debug, Clone)]
pub struct JupiterTokenClient {
    http: Client,
    base_url: String,
}

impl JupiterTokenClient {
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

    async fn query(&self, query: &str) -> Result<Vec<PoolEnrichment>, FeedError> {
        let url = format!("{}/search?query={}", self.base_url, query);
        let tokens: Vec<TokenInfo> = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FeedError::Http(e.to_string()))?
            .json()
            .await
            .map_err(|e| FeedError::Parse(e.to_string()))?;
        Ok(tokens.into_iter().map(map_token).collect())
    }
}

#[async_trait]
impl EnrichmentSource for JupiterTokenClient {
    async fn by_address(&self, mint: &str) -> Result<Option<PoolEnrichment>, FeedError> {
        let results = self.query(mint).await?;
        Ok(results.into_iter().find(|t| t.address == mint))
    }

    async fn search(&self, query: &str) -> Result<Vec<PoolEnrichment>, FeedError> {
        self.query(query).await
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenInfo {
    id: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    holder_count: Option<u64>,
    #[serde(default)]
    organic_score: Option<f64>,
}

fn map_token(token: TokenInfo) -> PoolEnrichment {
    PoolEnrichment {
        address: token.id,
        name: token.symbol,
        holder_count: token.holder_count,
        // The API scores 0-100, internal scale is 0-1
        organic_score: token.organic_score.map(|s| s / 100.0),
    }
}

/// Exchange placeholder for deployments without a signer. Entry in live
/// mode fails fast instead of pretending to swap.
#[derive(Debug, Default, Clone)]
pub struct UnsignedExchange;

#[async_trait]
impl AssetExchange for UnsignedExchange {
    async fn convert(
        &self,
        _from_mint: &str,
        _to_mint: &str,
        _raw_amount: u64,
        _max_slippage_bps: u16,
    ) -> Result<ConversionReceipt, ExchangeError> {
        Err(ExchangeError::Unsupported(
            "swap execution requires a transaction signer".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_oracle_creation() {
        let oracle = JupiterPriceOracle::new("https://lite-api.jup.ag/price/v2/", "So111");
        assert!(oracle.is_ok());
        assert_eq!(oracle.unwrap().base_url, "https://lite-api.jup.ag/price/v2");
    }

    #[test]
    fn test_price_response_parses_strings_and_nulls() {
        let body = r#"{
            "data": {
                "So111": { "price": "150.25" },
                "unknownMint": null
            }
        }"#;
        let response: PriceResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.data.len(), 2);
        assert_eq!(response.data["So111"].as_ref().unwrap().price, "150.25");
        assert!(response.data["unknownMint"].is_none());
    }

    #[test]
    fn test_token_info_maps_to_enrichment() {
        let body = r#"[{
            "id": "wifMint",
            "symbol": "WIF",
            "holderCount": 4200,
            "organicScore": 73.5
        }]"#;
        let tokens: Vec<TokenInfo> = serde_json::from_str(body).unwrap();
        let enrichment = map_token(tokens.into_iter().next().unwrap());
        assert_eq!(enrichment.address, "wifMint");
        assert_eq!(enrichment.holder_count, Some(4200));
        assert_relative_eq!(enrichment.organic_score.unwrap(), 0.735, epsilon = 1e-9);
    }

    #[test]
    fn test_token_info_tolerates_missing_fields() {
        let body = r#"[{ "id": "bare" }]"#;
        let tokens: Vec<TokenInfo> = serde_json::from_str(body).unwrap();
        let enrichment = map_token(tokens.into_iter().next().unwrap());
        assert_eq!(enrichment.holder_count, None);
        assert_eq!(enrichment.organic_score, None);
    }

    #[tokio::test]
    async fn test_unsigned_exchange_refuses() {
        let exchange = UnsignedExchange;
        let result = exchange.convert("a", "b", 100, 50).await;
        assert!(matches!(result, Err(ExchangeError::Unsupported(_))));
    }
}
