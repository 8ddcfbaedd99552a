//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these traits abstract:
//! - Pool discovery and enrichment feeds
//! - Market price oracle
//! - Asset conversion (swaps)
//! - On-chain DLMM position operations
//! - Durable record store
//! - Outbound notifications

pub mod market_data;
pub mod oracle;
pub mod exchange;
pub mod chain;
pub mod store;
pub mod notifier;
pub mod mocks;

pub use chain::{ChainError, LiquidityProvider, PoolState, PositionHoldings};
pub use exchange::{AssetExchange, ConversionReceipt, ExchangeError};
pub use market_data::{EnrichmentSource, FeedError, PoolEnrichment, PoolFeed};
pub use notifier::Notifier;
pub use oracle::{OracleError, PriceOracle};
pub use store::{RecordStore, StoreError};
