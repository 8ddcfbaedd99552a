//! Market data ports: pool discovery feed and secondary enrichment

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::pool::PoolSnapshot;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("data parsing error: {0}")]
    Parse(String),
    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// Secondary per-pool enrichment (holders, organic activity)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolEnrichment {
    pub address: String,
    pub name: String,
    pub holder_count: Option<u64>,
    pub organic_score: Option<f64>,
}

/// Primary pool discovery feed
#[async_trait]
pub trait PoolFeed: Send + Sync {
    /// Fetch up to `limit` pool snapshots, sorted by `sort_key`, optionally
    /// restricted to a provider-side tag
    async fn fetch(
        &self,
        limit: usize,
        sort_key: &str,
        filter_tag: Option<&str>,
    ) -> Result<Vec<PoolSnapshot>, FeedError>;
}

/// Secondary enrichment source keyed by pool address or name
#[async_trait]
pub trait EnrichmentSource: Send + Sync {
    async fn by_address(&self, address: &str) -> Result<Option<PoolEnrichment>, FeedError>;
    async fn search(&self, name: &str) -> Result<Vec<PoolEnrichment>, FeedError>;
}
