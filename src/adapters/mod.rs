//! Adapters Layer - Concrete implementations of the port traits
//!
//! - Meteora DLMM REST API for pool discovery and position reads
//! - Jupiter APIs for prices and token enrichment
//! - JSON file persistence
//! - Discord webhook alerts
//! - CLI surface

pub mod cli;
pub mod discord;
pub mod json_store;
pub mod jupiter;
pub mod meteora;

pub use discord::DiscordNotifier;
pub use json_store::JsonFileStore;
pub use jupiter::{JupiterPriceOracle, JupiterTokenClient, UnsignedExchange};
pub use meteora::MeteoraClient;
