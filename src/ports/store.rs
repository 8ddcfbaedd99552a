//! Record store port
//!
//! Durable bookkeeping for positions, rebalance history, and the decision
//! audit log, plus the two aggregates the risk monitor needs. The engine
//! never reads decision entries back.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::position::{DecisionLogEntry, Position, RebalanceRecord};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("position not found: {0}")]
    NotFound(String),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn insert_position(&self, position: &Position) -> Result<(), StoreError>;

    /// Replace the stored record for `position.id`
    async fn update_position(&self, position: &Position) -> Result<(), StoreError>;

    async fn position(&self, id: &str) -> Result<Option<Position>, StoreError>;

    async fn active_positions(&self) -> Result<Vec<Position>, StoreError>;

    async fn insert_rebalance(&self, record: &RebalanceRecord) -> Result<(), StoreError>;

    async fn log_decision(&self, entry: &DecisionLogEntry) -> Result<(), StoreError>;

    /// Sum of realized pnl over positions closed today (UTC), base units
    async fn today_realized_pnl(&self) -> Result<f64, StoreError>;

    /// Sum of entry amounts over currently active positions, base units
    async fn total_active_capital(&self) -> Result<f64, StoreError>;
}
