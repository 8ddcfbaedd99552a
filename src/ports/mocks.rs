//! Recording mocks for the port traits
//!
//! Deterministic in-memory implementations used by unit and integration
//! tests. Each mock records the calls it receives and returns configured
//! responses, so tests can assert both outcomes and interactions (for
//! example that a compensating conversion was attempted).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::pool::PoolSnapshot;
use crate::domain::position::{DecisionLogEntry, Position, PositionStatus, RebalanceRecord};

use super::chain::{ChainError, LiquidityProvider, PoolState, PositionHoldings};
use super::exchange::{AssetExchange, ConversionReceipt, ExchangeError};
use super::market_data::{FeedError, PoolFeed};
use super::notifier::Notifier;
use super::oracle::{OracleError, PriceOracle};
use super::store::{RecordStore, StoreError};

const LAMPORTS_PER_UNIT: f64 = 1_000_000_000.0;

/// Pool feed returning a fixed snapshot list
#[derive(Debug, Default)]
pub struct MockFeed {
    snapshots: Mutex<Vec<PoolSnapshot>>,
    fail: Mutex<bool>,
}

impl MockFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshots(self, snapshots: Vec<PoolSnapshot>) -> Self {
        *self.snapshots.lock().unwrap() = snapshots;
        self
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl PoolFeed for MockFeed {
    async fn fetch(
        &self,
        limit: usize,
        _sort_key: &str,
        _filter_tag: Option<&str>,
    ) -> Result<Vec<PoolSnapshot>, FeedError> {
        if *self.fail.lock().unwrap() {
            return Err(FeedError::Http("mock feed failure".to_string()));
        }
        let snapshots = self.snapshots.lock().unwrap();
        Ok(snapshots.iter().take(limit).cloned().collect())
    }
}

/// Oracle with a fixed base-asset price per whole unit of each mint
#[derive(Debug, Default)]
pub struct MockOracle {
    prices: Mutex<HashMap<String, f64>>,
    fail: Mutex<bool>,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Price of one whole unit (1e9 raw) of `mint`, in base asset units
    pub fn with_price(self, mint: &str, price: f64) -> Self {
        self.prices.lock().unwrap().insert(mint.to_string(), price);
        self
    }

    pub fn set_fail(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl PriceOracle for MockOracle {
    async fn value_in_base(&self, mint: &str, raw_amount: u64) -> Result<f64, OracleError> {
        if *self.fail.lock().unwrap() {
            return Err(OracleError::Http("mock oracle failure".to_string()));
        }
        let prices = self.prices.lock().unwrap();
        let price = prices
            .get(mint)
            .copied()
            .ok_or_else(|| OracleError::NoPriceData(mint.to_string()))?;
        Ok(price * raw_amount as f64 / LAMPORTS_PER_UNIT)
    }
}

/// Exchange that converts 1:1 by default, records every call, and can be
/// told to fail specific pairs
#[derive(Debug, Default)]
pub struct MockExchange {
    calls: Mutex<Vec<(String, String, u64)>>,
    fail_pairs: Mutex<HashSet<(String, String)>>,
    rates: Mutex<HashMap<(String, String), f64>>,
}

impl MockExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(self, from: &str, to: &str, rate: f64) -> Self {
        self.rates
            .lock()
            .unwrap()
            .insert((from.to_string(), to.to_string()), rate);
        self
    }

    pub fn fail_pair(&self, from: &str, to: &str) {
        self.fail_pairs
            .lock()
            .unwrap()
            .insert((from.to_string(), to.to_string()));
    }

    pub fn calls(&self) -> Vec<(String, String, u64)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AssetExchange for MockExchange {
    async fn convert(
        &self,
        from_mint: &str,
        to_mint: &str,
        raw_amount: u64,
        _max_slippage_bps: u16,
    ) -> Result<ConversionReceipt, ExchangeError> {
        self.calls
            .lock()
            .unwrap()
            .push((from_mint.to_string(), to_mint.to_string(), raw_amount));
        let key = (from_mint.to_string(), to_mint.to_string());
        if self.fail_pairs.lock().unwrap().contains(&key) {
            return Err(ExchangeError::Api("mock conversion failure".to_string()));
        }
        let rate = self.rates.lock().unwrap().get(&key).copied().unwrap_or(1.0);
        Ok(ConversionReceipt {
            output_amount: (raw_amount as f64 * rate) as u64,
            reference: format!("mock-swap-{}", self.calls.lock().unwrap().len()),
        })
    }
}

/// Liquidity provider with configurable pool state, creation outcome, and
/// holdings
#[derive(Debug)]
pub struct MockChain {
    pool_state: Mutex<PoolState>,
    create_result: Mutex<Result<String, String>>,
    holdings: Mutex<PositionHoldings>,
    created: Mutex<Vec<(String, i32, i32, u64, u64)>>,
    withdrawn: Mutex<Vec<String>>,
    fail_pool_state: Mutex<bool>,
    fail_holdings: Mutex<bool>,
    fail_withdraw: Mutex<bool>,
}

impl Default for MockChain {
    fn default() -> Self {
        Self {
            pool_state: Mutex::new(PoolState {
                active_bin: 0,
                price: 1.0,
                mint_x: "mintX".to_string(),
                mint_y: "mintY".to_string(),
            }),
            create_result: Mutex::new(Ok("mock-position-ref".to_string())),
            holdings: Mutex::new(PositionHoldings {
                amount_x: 0,
                amount_y: 0,
                fee_x: 0,
                fee_y: 0,
            }),
            created: Mutex::new(Vec::new()),
            withdrawn: Mutex::new(Vec::new()),
            fail_pool_state: Mutex::new(false),
            fail_holdings: Mutex::new(false),
            fail_withdraw: Mutex::new(false),
        }
    }
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool_state(self, state: PoolState) -> Self {
        *self.pool_state.lock().unwrap() = state;
        self
    }

    pub fn with_holdings(self, holdings: PositionHoldings) -> Self {
        *self.holdings.lock().unwrap() = holdings;
        self
    }

    pub fn set_holdings(&self, holdings: PositionHoldings) {
        *self.holdings.lock().unwrap() = holdings;
    }

    pub fn fail_create(&self, message: &str) {
        *self.create_result.lock().unwrap() = Err(message.to_string());
    }

    pub fn set_fail_pool_state(&self, fail: bool) {
        *self.fail_pool_state.lock().unwrap() = fail;
    }

    pub fn set_fail_holdings(&self, fail: bool) {
        *self.fail_holdings.lock().unwrap() = fail;
    }

    pub fn set_fail_withdraw(&self, fail: bool) {
        *self.fail_withdraw.lock().unwrap() = fail;
    }

    pub fn created_positions(&self) -> Vec<(String, i32, i32, u64, u64)> {
        self.created.lock().unwrap().clone()
    }

    pub fn withdrawn_refs(&self) -> Vec<String> {
        self.withdrawn.lock().unwrap().clone()
    }
}

#[async_trait]
impl LiquidityProvider for MockChain {
    async fn pool_state(&self, _pool_address: &str) -> Result<PoolState, ChainError> {
        if *self.fail_pool_state.lock().unwrap() {
            return Err(ChainError::Rpc("mock pool state failure".to_string()));
        }
        Ok(self.pool_state.lock().unwrap().clone())
    }

    async fn create_position(
        &self,
        pool_address: &str,
        lower_bin: i32,
        upper_bin: i32,
        amount_x: u64,
        amount_y: u64,
    ) -> Result<String, ChainError> {
        self.created.lock().unwrap().push((
            pool_address.to_string(),
            lower_bin,
            upper_bin,
            amount_x,
            amount_y,
        ));
        self.create_result
            .lock()
            .unwrap()
            .clone()
            .map_err(ChainError::Rpc)
    }

    async fn current_holdings(
        &self,
        _position_ref: &str,
    ) -> Result<PositionHoldings, ChainError> {
        if *self.fail_holdings.lock().unwrap() {
            return Err(ChainError::Rpc("mock holdings failure".to_string()));
        }
        Ok(*self.holdings.lock().unwrap())
    }

    async fn withdraw_all(&self, position_ref: &str) -> Result<String, ChainError> {
        if *self.fail_withdraw.lock().unwrap() {
            return Err(ChainError::Rpc("mock withdraw failure".to_string()));
        }
        self.withdrawn.lock().unwrap().push(position_ref.to_string());
        Ok(format!("mock-withdraw-{}", position_ref))
    }
}

/// Full in-memory record store
#[derive(Debug, Default)]
pub struct MemoryStore {
    positions: Mutex<HashMap<String, Position>>,
    rebalances: Mutex<Vec<RebalanceRecord>>,
    decisions: Mutex<Vec<DecisionLogEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn decisions(&self) -> Vec<DecisionLogEntry> {
        self.decisions.lock().unwrap().clone()
    }

    pub fn rebalances(&self) -> Vec<RebalanceRecord> {
        self.rebalances.lock().unwrap().clone()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn insert_position(&self, position: &Position) -> Result<(), StoreError> {
        self.positions
            .lock()
            .unwrap()
            .insert(position.id.clone(), position.clone());
        Ok(())
    }

    async fn update_position(&self, position: &Position) -> Result<(), StoreError> {
        let mut positions = self.positions.lock().unwrap();
        if !positions.contains_key(&position.id) {
            return Err(StoreError::NotFound(position.id.clone()));
        }
        positions.insert(position.id.clone(), position.clone());
        Ok(())
    }

    async fn position(&self, id: &str) -> Result<Option<Position>, StoreError> {
        Ok(self.positions.lock().unwrap().get(id).cloned())
    }

    async fn active_positions(&self) -> Result<Vec<Position>, StoreError> {
        let mut active: Vec<Position> = self
            .positions
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.status == PositionStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.entry_time.cmp(&b.entry_time));
        Ok(active)
    }

    async fn insert_rebalance(&self, record: &RebalanceRecord) -> Result<(), StoreError> {
        self.rebalances.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn log_decision(&self, entry: &DecisionLogEntry) -> Result<(), StoreError> {
        self.decisions.lock().unwrap().push(entry.clone());
        Ok(())
    }

    async fn today_realized_pnl(&self) -> Result<f64, StoreError> {
        let today = Utc::now().date_naive();
        let total = self
            .positions
            .lock()
            .unwrap()
            .values()
            .filter(|p| {
                p.status == PositionStatus::Closed
                    && p.exit_time.map_or(false, |t| t.date_naive() == today)
            })
            .filter_map(|p| p.realized_pnl)
            .sum();
        Ok(total)
    }

    async fn total_active_capital(&self) -> Result<f64, StoreError> {
        let total = self
            .positions
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.status == PositionStatus::Active)
            .map(|p| p.entry_amount)
            .sum();
        Ok(total)
    }
}

/// Notifier that records every call
#[derive(Debug, Default)]
pub struct MockNotifier {
    emergencies: Mutex<Vec<(usize, String)>>,
    closes: Mutex<Vec<(String, String, String, f64, f64)>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emergencies(&self) -> Vec<(usize, String)> {
        self.emergencies.lock().unwrap().clone()
    }

    pub fn closes(&self) -> Vec<(String, String, String, f64, f64)> {
        self.closes.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn emergency_exit(&self, count: usize, reason: &str) {
        self.emergencies
            .lock()
            .unwrap()
            .push((count, reason.to_string()));
    }

    async fn position_closed(&self, id: &str, name: &str, reason: &str, pnl: f64, fees: f64) {
        self.closes.lock().unwrap().push((
            id.to_string(),
            name.to_string(),
            reason.to_string(),
            pnl,
            fees,
        ));
    }
}
