//! Position Lifecycle Manager
//!
//! Opens, values, and closes liquidity positions, recording every
//! transition in the injected record store. Live entries run a compensating
//! conversion when the provisioning step fails after capital has already
//! been swapped; the recovery is best-effort and the original failure is
//! always the one propagated.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use crate::domain::position::{
    generate_position_id, DecisionAction, DecisionLogEntry, Position, PositionError,
    RebalanceRecord, RiskDefaults,
};
use crate::ports::chain::LiquidityProvider;
use crate::ports::exchange::AssetExchange;
use crate::ports::notifier::Notifier;
use crate::ports::oracle::PriceOracle;
use crate::ports::store::RecordStore;
use crate::strategy::selector::{Action, StrategyDecision};

/// Raw units per whole base asset unit
pub const LAMPORTS_PER_BASE: f64 = 1_000_000_000.0;

/// Outcome of the compensating conversion after a partial entry failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Stranded paired-asset balance converted back, raw base units
    Recovered { amount: u64 },
    /// Conversion back failed too; balance stranded for manual handling
    Failed,
}

impl std::fmt::Display for RecoveryOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecoveryOutcome::Recovered { amount } => {
                write!(f, "recovered {} raw base units", amount)
            }
            RecoveryOutcome::Failed => write!(f, "recovery failed"),
        }
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("external service failure: {0}")]
    External(String),

    #[error("insufficient funds: {capital} lamports below minimum entry {min}")]
    InsufficientFunds { capital: u64, min: u64 },

    #[error("invalid state for position {id}: {reason}")]
    InvalidState { id: String, reason: String },

    #[error("position not found: {0}")]
    NotFound(String),

    #[error("entry failed after conversion ({recovery}): {source}")]
    PartialEntry {
        recovery: RecoveryOutcome,
        #[source]
        source: Box<LifecycleError>,
    },
}

impl From<PositionError> for LifecycleError {
    fn from(err: PositionError) -> Self {
        match err {
            PositionError::NotActive { id, status } => LifecycleError::InvalidState {
                id,
                reason: format!("position is {}, not active", status),
            },
            PositionError::InvalidEntryAmount(amount) => {
                LifecycleError::Validation(format!("invalid entry amount: {}", amount))
            }
        }
    }
}

/// Lifecycle tuning, sourced from config
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Base settlement asset mint
    pub base_mint: String,
    /// Abort live entry when pool and oracle prices diverge beyond this
    pub max_price_divergence_pct: f64,
    pub slippage_bps: u16,
    /// Minimum viable entry in raw base units
    pub min_capital_lamports: u64,
    /// Record positions without moving funds
    pub simulate: bool,
    pub defaults: RiskDefaults,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            base_mint: "So11111111111111111111111111111111111111112".to_string(),
            max_price_divergence_pct: 3.0,
            slippage_bps: 100,
            min_capital_lamports: 100_000_000, // 0.1 base units
            simulate: true,
            defaults: RiskDefaults::default(),
        }
    }
}

pub struct PositionManager {
    oracle: Arc<dyn PriceOracle>,
    exchange: Arc<dyn AssetExchange>,
    chain: Arc<dyn LiquidityProvider>,
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    config: LifecycleConfig,
}

impl PositionManager {
    pub fn new(
        oracle: Arc<dyn PriceOracle>,
        exchange: Arc<dyn AssetExchange>,
        chain: Arc<dyn LiquidityProvider>,
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        config: LifecycleConfig,
    ) -> Self {
        Self {
            oracle,
            exchange,
            chain,
            store,
            notifier,
            config,
        }
    }

    pub fn defaults(&self) -> &RiskDefaults {
        &self.config.defaults
    }

    /// Open a position for an entry decision, committing `capital_lamports`
    /// of the base asset. Returns the generated position id.
    pub async fn open(
        &self,
        decision: &StrategyDecision,
        capital_lamports: u64,
    ) -> Result<String, LifecycleError> {
        if decision.action != Action::Enter {
            return Err(LifecycleError::Validation(format!(
                "decision for {} is a skip, nothing to open",
                decision.pool_name
            )));
        }
        if capital_lamports < self.config.min_capital_lamports {
            return Err(LifecycleError::InsufficientFunds {
                capital: capital_lamports,
                min: self.config.min_capital_lamports,
            });
        }

        let result = if self.config.simulate {
            self.open_simulated(decision, capital_lamports).await
        } else {
            self.open_live(decision, capital_lamports).await
        };

        if let Err(ref err) = result {
            self.log_error_decision(decision, err).await;
        }
        result
    }

    async fn open_simulated(
        &self,
        decision: &StrategyDecision,
        capital_lamports: u64,
    ) -> Result<String, LifecycleError> {
        // Best effort: an unreadable pool degrades to zero reference values
        // instead of blocking a paper entry
        let (active_bin, price) = match self.chain.pool_state(&decision.pool_address).await {
            Ok(state) => (state.active_bin, state.price),
            Err(err) => {
                tracing::warn!(
                    pool = %decision.pool_name,
                    "pool state unreadable, simulating entry at defaults: {}",
                    err
                );
                (0, 0.0)
            }
        };

        let now = Utc::now();
        let mut position = Position::new(
            generate_position_id(now),
            decision.pool_address.clone(),
            decision.pool_name.clone(),
            String::new(),
            self.config.base_mint.clone(),
            decision.preset.name.to_string(),
            now,
            capital_lamports as f64 / LAMPORTS_PER_BASE,
            price,
            active_bin + decision.range.lower,
            active_bin + decision.range.upper,
            true,
        )?;
        self.apply_preset_thresholds(&mut position, decision);

        self.store
            .insert_position(&position)
            .await
            .map_err(|e| LifecycleError::External(e.to_string()))?;

        tracing::info!(
            id = %position.id,
            pool = %position.pool_name,
            strategy = %position.strategy,
            amount = position.entry_amount,
            "simulated position opened"
        );
        Ok(position.id)
    }

    async fn open_live(
        &self,
        decision: &StrategyDecision,
        capital_lamports: u64,
    ) -> Result<String, LifecycleError> {
        let state = self
            .chain
            .pool_state(&decision.pool_address)
            .await
            .map_err(|e| LifecycleError::External(e.to_string()))?;

        // The pool must hold the settlement asset on one side
        let (paired_mint, base_is_x) = if state.mint_x == self.config.base_mint {
            (state.mint_y.clone(), true)
        } else if state.mint_y == self.config.base_mint {
            (state.mint_x.clone(), false)
        } else {
            return Err(LifecycleError::Validation(format!(
                "pool {} does not contain the base asset",
                decision.pool_name
            )));
        };

        self.check_price_divergence(&decision.pool_name, &paired_mint, state.price, base_is_x)
            .await?;

        // Convert half the committed capital into the paired asset
        let half = capital_lamports / 2;
        let receipt = self
            .exchange
            .convert(&self.config.base_mint, &paired_mint, half, self.config.slippage_bps)
            .await
            .map_err(|e| LifecycleError::External(e.to_string()))?;

        let base_side = capital_lamports - half;
        let (amount_x, amount_y) = if base_is_x {
            (base_side, receipt.output_amount)
        } else {
            (receipt.output_amount, base_side)
        };

        let lower_bin = state.active_bin + decision.range.lower;
        let upper_bin = state.active_bin + decision.range.upper;
        let position_ref = match self
            .chain
            .create_position(&decision.pool_address, lower_bin, upper_bin, amount_x, amount_y)
            .await
        {
            Ok(position_ref) => position_ref,
            Err(err) => {
                // Partial failure: capital is split across two assets with
                // no position to show for it. Convert back, then surface
                // the original cause.
                let recovery = self
                    .recover_stranded(&paired_mint, receipt.output_amount)
                    .await;
                return Err(LifecycleError::PartialEntry {
                    recovery,
                    source: Box::new(LifecycleError::External(err.to_string())),
                });
            }
        };

        let now = Utc::now();
        let mut position = Position::new(
            generate_position_id(now),
            decision.pool_address.clone(),
            decision.pool_name.clone(),
            state.mint_x.clone(),
            state.mint_y.clone(),
            decision.preset.name.to_string(),
            now,
            capital_lamports as f64 / LAMPORTS_PER_BASE,
            state.price,
            lower_bin,
            upper_bin,
            false,
        )?;
        position.position_ref = Some(position_ref);
        self.apply_preset_thresholds(&mut position, decision);

        self.store
            .insert_position(&position)
            .await
            .map_err(|e| LifecycleError::External(e.to_string()))?;

        tracing::info!(
            id = %position.id,
            pool = %position.pool_name,
            strategy = %position.strategy,
            amount = position.entry_amount,
            range = ?(lower_bin, upper_bin),
            "live position opened"
        );
        Ok(position.id)
    }

    /// Stale-pool protection: the pool's internal price must track the
    /// external market price
    async fn check_price_divergence(
        &self,
        pool_name: &str,
        paired_mint: &str,
        pool_price: f64,
        base_is_x: bool,
    ) -> Result<(), LifecycleError> {
        let market_price = self
            .oracle
            .value_in_base(paired_mint, LAMPORTS_PER_BASE as u64)
            .await
            .map_err(|e| LifecycleError::External(e.to_string()))?;
        if market_price <= 0.0 {
            return Err(LifecycleError::External(format!(
                "oracle returned non-positive price for {}",
                paired_mint
            )));
        }

        // Pool price is Y per X; normalize to base per paired unit
        let pool_price_in_base = if base_is_x {
            if pool_price <= 0.0 {
                return Err(LifecycleError::Validation(format!(
                    "pool {} reports non-positive price",
                    pool_name
                )));
            }
            1.0 / pool_price
        } else {
            pool_price
        };

        let divergence_pct = ((pool_price_in_base - market_price) / market_price).abs() * 100.0;
        if divergence_pct > self.config.max_price_divergence_pct {
            return Err(LifecycleError::Validation(format!(
                "pool {} price diverges {:.2}% from market (max {:.2}%), refusing entry",
                pool_name, divergence_pct, self.config.max_price_divergence_pct
            )));
        }
        Ok(())
    }

    /// Best-effort compensating conversion. Its own failure is logged and
    /// reported in the outcome, never thrown, so the original cause of the
    /// partial entry is preserved.
    async fn recover_stranded(&self, paired_mint: &str, stranded: u64) -> RecoveryOutcome {
        match self
            .exchange
            .convert(paired_mint, &self.config.base_mint, stranded, self.config.slippage_bps)
            .await
        {
            Ok(receipt) => {
                tracing::warn!(
                    mint = %paired_mint,
                    recovered = receipt.output_amount,
                    "entry failed after conversion, stranded balance converted back"
                );
                RecoveryOutcome::Recovered {
                    amount: receipt.output_amount,
                }
            }
            Err(err) => {
                tracing::error!(
                    mint = %paired_mint,
                    stranded,
                    "compensating conversion failed, balance stranded for manual handling: {}",
                    err
                );
                RecoveryOutcome::Failed
            }
        }
    }

    /// Close an active position, realize pnl, and record a single atomic
    /// close. Returns the closed position.
    pub async fn close(&self, id: &str, reason: &str) -> Result<Position, LifecycleError> {
        let mut position = self
            .store
            .position(id)
            .await
            .map_err(|e| LifecycleError::External(e.to_string()))?
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))?;

        if !position.is_active() {
            return Err(LifecycleError::InvalidState {
                id: id.to_string(),
                reason: format!("cannot close position in status {}", position.status),
            });
        }

        let now = Utc::now();
        if position.simulated {
            // No external calls, zero realized pnl by design
            position.close(now, position.entry_amount, reason, 0.0)?;
        } else {
            let (exit_amount, pnl, claimed_fees) = self.unwind_live(&position).await?;
            position.fees_earned += claimed_fees;
            position.close(now, exit_amount, reason, pnl)?;
        }

        self.store
            .update_position(&position)
            .await
            .map_err(|e| LifecycleError::External(e.to_string()))?;

        tracing::info!(
            id = %position.id,
            pool = %position.pool_name,
            reason,
            pnl = position.realized_pnl.unwrap_or(0.0),
            fees = position.fees_earned,
            "position closed"
        );
        self.notifier
            .position_closed(
                &position.id,
                &position.pool_name,
                reason,
                position.realized_pnl.unwrap_or(0.0),
                position.fees_earned,
            )
            .await;
        Ok(position)
    }

    /// Withdraw everything and settle back to the base asset. Returns
    /// (exit amount, realized pnl, fees claimed), all in base units.
    async fn unwind_live(&self, position: &Position) -> Result<(f64, f64, f64), LifecycleError> {
        let position_ref = position.position_ref.as_deref().ok_or_else(|| {
            LifecycleError::InvalidState {
                id: position.id.clone(),
                reason: "live position has no on-chain reference".to_string(),
            }
        })?;

        let holdings = self
            .chain
            .current_holdings(position_ref)
            .await
            .map_err(|e| LifecycleError::External(e.to_string()))?;
        self.chain
            .withdraw_all(position_ref)
            .await
            .map_err(|e| LifecycleError::External(e.to_string()))?;

        let base_is_x = position.mint_x == self.config.base_mint;
        let (base_amount, base_fee, paired_mint, paired_amount, paired_fee) = if base_is_x {
            (
                holdings.amount_x,
                holdings.fee_x,
                position.mint_y.as_str(),
                holdings.amount_y,
                holdings.fee_y,
            )
        } else {
            (
                holdings.amount_y,
                holdings.fee_y,
                position.mint_x.as_str(),
                holdings.amount_x,
                holdings.fee_x,
            )
        };

        // Convert the entire paired side (principal plus fees) back in one
        // swap; a failure here is a residual-balance condition, not a
        // failed close
        let paired_total = paired_amount + paired_fee;
        let converted = if paired_total > 0 {
            match self
                .exchange
                .convert(
                    paired_mint,
                    &self.config.base_mint,
                    paired_total,
                    self.config.slippage_bps,
                )
                .await
            {
                Ok(receipt) => receipt.output_amount,
                Err(err) => {
                    tracing::warn!(
                        id = %position.id,
                        mint = %paired_mint,
                        amount = paired_total,
                        "residual balance: conversion back to base failed, manual follow-up required: {}",
                        err
                    );
                    0
                }
            }
        } else {
            0
        };

        // Apportion the converted output between principal and fees
        let fee_fraction = if paired_total > 0 {
            paired_fee as f64 / paired_total as f64
        } else {
            0.0
        };
        let converted_f = converted as f64;
        let recovered_principal =
            (base_amount as f64 + converted_f * (1.0 - fee_fraction)) / LAMPORTS_PER_BASE;
        let claimed_fees = (base_fee as f64 + converted_f * fee_fraction) / LAMPORTS_PER_BASE;

        let pnl = (recovered_principal - position.entry_amount) + claimed_fees;
        let exit_amount = recovered_principal + claimed_fees;
        Ok((exit_amount, pnl, claimed_fees))
    }

    /// Current value of a position in base units, or None when any query
    /// fails. Callers treat None as "skip this tick's threshold checks".
    pub async fn valuate(&self, position: &Position) -> Option<f64> {
        if position.simulated {
            return Some(position.entry_amount + position.fees_earned);
        }

        let position_ref = position.position_ref.as_deref()?;
        let holdings = match self.chain.current_holdings(position_ref).await {
            Ok(h) => h,
            Err(err) => {
                tracing::debug!(id = %position.id, "valuation unavailable: {}", err);
                return None;
            }
        };

        let base_is_x = position.mint_x == self.config.base_mint;
        let (base_total, paired_mint, paired_total) = if base_is_x {
            (
                holdings.amount_x + holdings.fee_x,
                position.mint_y.as_str(),
                holdings.amount_y + holdings.fee_y,
            )
        } else {
            (
                holdings.amount_y + holdings.fee_y,
                position.mint_x.as_str(),
                holdings.amount_x + holdings.fee_x,
            )
        };

        let paired_value = if paired_total > 0 {
            match self.oracle.value_in_base(paired_mint, paired_total).await {
                Ok(value) => value,
                Err(err) => {
                    tracing::debug!(id = %position.id, "valuation unavailable: {}", err);
                    return None;
                }
            }
        } else {
            0.0
        };

        Some(base_total as f64 / LAMPORTS_PER_BASE + paired_value)
    }

    /// Record a range adjustment: append-only history entry plus the
    /// position's new bounds and claimed fees
    pub async fn record_rebalance(
        &self,
        id: &str,
        new_lower_bin: i32,
        new_upper_bin: i32,
        old_active_bin: i32,
        new_active_bin: i32,
        fees_claimed: f64,
    ) -> Result<(), LifecycleError> {
        let mut position = self
            .store
            .position(id)
            .await
            .map_err(|e| LifecycleError::External(e.to_string()))?
            .ok_or_else(|| LifecycleError::NotFound(id.to_string()))?;
        if !position.is_active() {
            return Err(LifecycleError::InvalidState {
                id: id.to_string(),
                reason: format!("cannot rebalance position in status {}", position.status),
            });
        }

        let record = RebalanceRecord {
            position_id: position.id.clone(),
            timestamp: Utc::now(),
            old_lower_bin: position.lower_bin,
            old_upper_bin: position.upper_bin,
            new_lower_bin,
            new_upper_bin,
            old_active_bin,
            new_active_bin,
            fees_claimed,
        };
        self.store
            .insert_rebalance(&record)
            .await
            .map_err(|e| LifecycleError::External(e.to_string()))?;

        position.lower_bin = new_lower_bin;
        position.upper_bin = new_upper_bin;
        position.fees_earned += fees_claimed;
        position.rebalance_count += 1;
        self.store
            .update_position(&position)
            .await
            .map_err(|e| LifecycleError::External(e.to_string()))?;
        Ok(())
    }

    /// Copy the preset's risk thresholds onto the position. Absent values
    /// stay None and fall back to the account defaults at evaluation time.
    fn apply_preset_thresholds(&self, position: &mut Position, decision: &StrategyDecision) {
        position.take_profit_pct = decision.preset.take_profit_pct;
        position.stop_loss_pct = decision.preset.stop_loss_pct;
        position.max_hold_hours = decision.preset.max_hold_hours;
    }

    async fn log_error_decision(&self, decision: &StrategyDecision, err: &LifecycleError) {
        let entry = DecisionLogEntry {
            timestamp: Utc::now(),
            pool_address: decision.pool_address.clone(),
            pool_name: decision.pool_name.clone(),
            action: DecisionAction::Error,
            strategy: decision.preset.name.to_string(),
            rationale: format!("error:{}", err),
            confidence: decision.confidence.to_string(),
            condition: decision.condition.label(),
        };
        if let Err(log_err) = self.store.log_decision(&entry).await {
            tracing::warn!("failed to record error decision: {}", log_err);
        }
    }
}
