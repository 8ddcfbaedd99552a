#![allow(dead_code, unused_imports, unused_variables)]
//! DLMM Ranger - Automated Liquidity Range Manager Library
//!
//! Opens, monitors, and closes concentrated-liquidity positions on Solana
//! DLMM pools based on classified market conditions and risk limits.
//!
//! # Modules
//!
//! - `domain`: Core business logic (PoolSnapshot, MarketCondition, Position, exit rules)
//! - `strategy`: Preset catalogue, rule table, and the strategy selector
//! - `ports`: Trait abstractions (PoolFeed, PriceOracle, AssetExchange, LiquidityProvider, RecordStore, Notifier)
//! - `adapters`: External implementations (Meteora, Jupiter, JSON store, Discord, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Position lifecycle manager, exit monitor, and orchestrator

pub mod domain;
pub mod strategy;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
