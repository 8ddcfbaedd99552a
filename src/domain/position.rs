//! Position Entity
//!
//! The mutable lifecycle entity for a liquidity position, plus the
//! append-only records written alongside it (rebalance history and the
//! decision audit log). Status transitions are guarded here so a position
//! can be closed at most once, no matter which caller drives the close.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionStatus {
    Active,
    Closed,
    Failed,
}

impl std::fmt::Display for PositionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PositionStatus::Active => "active",
            PositionStatus::Closed => "closed",
            PositionStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Error)]
pub enum PositionError {
    #[error("position {id} is {status}, not active")]
    NotActive { id: String, status: PositionStatus },
    #[error("invalid entry amount: {0}")]
    InvalidEntryAmount(f64),
}

/// Account-wide exit thresholds, applied where a position carries no override
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RiskDefaults {
    pub stop_loss_pct: f64,
    pub take_profit_pct: f64,
    pub max_hold_hours: f64,
}

impl Default for RiskDefaults {
    fn default() -> Self {
        Self {
            stop_loss_pct: 20.0,
            take_profit_pct: 50.0,
            max_hold_hours: 72.0,
        }
    }
}

/// A liquidity position and its lifecycle state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    /// Generated identity, e.g. "pos-1718000000000-a3f1"
    pub id: String,
    pub pool_address: String,
    pub pool_name: String,
    pub mint_x: String,
    pub mint_y: String,
    /// Name of the preset that opened this position
    pub strategy: String,
    pub status: PositionStatus,
    pub entry_time: DateTime<Utc>,
    /// Committed capital in base asset units, always > 0
    pub entry_amount: f64,
    /// Pool price observed at entry (0.0 when unreadable in simulated mode)
    pub entry_price: f64,
    /// Resolved lower bin bound at entry
    pub lower_bin: i32,
    /// Resolved upper bin bound at entry
    pub upper_bin: i32,
    /// Per-position threshold overrides; account defaults apply when None
    pub stop_loss_pct: Option<f64>,
    pub take_profit_pct: Option<f64>,
    pub max_hold_hours: Option<f64>,
    /// Fees accumulated in base asset units
    pub fees_earned: f64,
    pub rebalance_count: u32,
    /// On-chain position account; None for simulated positions
    pub position_ref: Option<String>,
    pub simulated: bool,
    pub exit_time: Option<DateTime<Utc>>,
    pub exit_amount: Option<f64>,
    pub exit_reason: Option<String>,
    pub realized_pnl: Option<f64>,
}

impl Position {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        pool_address: String,
        pool_name: String,
        mint_x: String,
        mint_y: String,
        strategy: String,
        entry_time: DateTime<Utc>,
        entry_amount: f64,
        entry_price: f64,
        lower_bin: i32,
        upper_bin: i32,
        simulated: bool,
    ) -> Result<Self, PositionError> {
        if entry_amount <= 0.0 {
            return Err(PositionError::InvalidEntryAmount(entry_amount));
        }
        Ok(Self {
            id,
            pool_address,
            pool_name,
            mint_x,
            mint_y,
            strategy,
            status: PositionStatus::Active,
            entry_time,
            entry_amount,
            entry_price,
            lower_bin,
            upper_bin,
            stop_loss_pct: None,
            take_profit_pct: None,
            max_hold_hours: None,
            fees_earned: 0.0,
            rebalance_count: 0,
            position_ref: None,
            simulated,
            exit_time: None,
            exit_amount: None,
            exit_reason: None,
            realized_pnl: None,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == PositionStatus::Active
    }

    /// Guarded transition active -> closed. The only way a position closes.
    pub fn close(
        &mut self,
        exit_time: DateTime<Utc>,
        exit_amount: f64,
        reason: &str,
        realized_pnl: f64,
    ) -> Result<(), PositionError> {
        if self.status != PositionStatus::Active {
            return Err(PositionError::NotActive {
                id: self.id.clone(),
                status: self.status,
            });
        }
        self.status = PositionStatus::Closed;
        self.exit_time = Some(exit_time);
        self.exit_amount = Some(exit_amount);
        self.exit_reason = Some(reason.to_string());
        self.realized_pnl = Some(realized_pnl);
        Ok(())
    }

    /// Guarded transition active -> failed
    pub fn fail(&mut self, exit_time: DateTime<Utc>, reason: &str) -> Result<(), PositionError> {
        if self.status != PositionStatus::Active {
            return Err(PositionError::NotActive {
                id: self.id.clone(),
                status: self.status,
            });
        }
        self.status = PositionStatus::Failed;
        self.exit_time = Some(exit_time);
        self.exit_reason = Some(reason.to_string());
        Ok(())
    }

    pub fn effective_stop_loss_pct(&self, defaults: &RiskDefaults) -> f64 {
        self.stop_loss_pct.unwrap_or(defaults.stop_loss_pct)
    }

    pub fn effective_take_profit_pct(&self, defaults: &RiskDefaults) -> f64 {
        self.take_profit_pct.unwrap_or(defaults.take_profit_pct)
    }

    pub fn effective_max_hold_hours(&self, defaults: &RiskDefaults) -> f64 {
        self.max_hold_hours.unwrap_or(defaults.max_hold_hours)
    }

    /// PnL percentage of a live valuation against the entry amount
    pub fn pnl_pct(&self, current_value: f64) -> f64 {
        if self.entry_amount <= 0.0 {
            return 0.0;
        }
        (current_value - self.entry_amount) / self.entry_amount * 100.0
    }

    pub fn age_hours(&self, now: DateTime<Utc>) -> f64 {
        (now - self.entry_time).num_seconds().max(0) as f64 / 3600.0
    }
}

/// Append-only record of one range adjustment. Never mutated after insert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebalanceRecord {
    pub position_id: String,
    pub timestamp: DateTime<Utc>,
    pub old_lower_bin: i32,
    pub old_upper_bin: i32,
    pub new_lower_bin: i32,
    pub new_upper_bin: i32,
    pub old_active_bin: i32,
    pub new_active_bin: i32,
    /// Fees claimed at the moment of adjustment, base asset units
    pub fees_claimed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DecisionAction {
    Enter,
    Skip,
    Error,
}

impl std::fmt::Display for DecisionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DecisionAction::Enter => "enter",
            DecisionAction::Skip => "skip",
            DecisionAction::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Append-only audit record of every evaluate-or-act event, written for
/// offline analysis and never read back by the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionLogEntry {
    pub timestamp: DateTime<Utc>,
    pub pool_address: String,
    pub pool_name: String,
    pub action: DecisionAction,
    pub strategy: String,
    pub rationale: String,
    pub confidence: String,
    /// Condition label, e.g. "memecoin/high/very_high/uptrend"
    pub condition: String,
}

/// Generate a position id from the current time plus a random suffix
pub fn generate_position_id(now: DateTime<Utc>) -> String {
    format!("pos-{}-{:04x}", now.timestamp_millis(), rand::random::<u16>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn position() -> Position {
        Position::new(
            "pos-1".to_string(),
            "pool".to_string(),
            "WIF-SOL".to_string(),
            "wif".to_string(),
            "sol".to_string(),
            "MEME_SCALPER".to_string(),
            Utc::now(),
            1.0,
            0.002,
            -10,
            10,
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_new_position_is_active() {
        let p = position();
        assert_eq!(p.status, PositionStatus::Active);
        assert!(p.is_active());
        assert!(p.exit_time.is_none());
    }

    #[test]
    fn test_entry_amount_must_be_positive() {
        let result = Position::new(
            "pos-2".to_string(),
            "pool".to_string(),
            "WIF-SOL".to_string(),
            "wif".to_string(),
            "sol".to_string(),
            "MEME_SCALPER".to_string(),
            Utc::now(),
            0.0,
            0.002,
            -10,
            10,
            false,
        );
        assert!(matches!(result, Err(PositionError::InvalidEntryAmount(_))));
    }

    #[test]
    fn test_close_transition() {
        let mut p = position();
        p.close(Utc::now(), 1.2, "take_profit", 0.2).unwrap();
        assert_eq!(p.status, PositionStatus::Closed);
        assert_eq!(p.exit_reason.as_deref(), Some("take_profit"));
        assert_eq!(p.realized_pnl, Some(0.2));
    }

    #[test]
    fn test_double_close_rejected_and_pnl_unchanged() {
        let mut p = position();
        p.close(Utc::now(), 1.2, "take_profit", 0.2).unwrap();
        let result = p.close(Utc::now(), 0.5, "stop_loss", -0.5);
        assert!(matches!(result, Err(PositionError::NotActive { .. })));
        // The failed second close must not alter the stored outcome
        assert_eq!(p.realized_pnl, Some(0.2));
        assert_eq!(p.exit_reason.as_deref(), Some("take_profit"));
    }

    #[test]
    fn test_close_after_fail_rejected() {
        let mut p = position();
        p.fail(Utc::now(), "error:create_position").unwrap();
        assert_eq!(p.status, PositionStatus::Failed);
        assert!(p.close(Utc::now(), 1.0, "take_profit", 0.0).is_err());
    }

    #[test]
    fn test_effective_thresholds_prefer_override() {
        let defaults = RiskDefaults {
            stop_loss_pct: 20.0,
            take_profit_pct: 50.0,
            max_hold_hours: 72.0,
        };
        let mut p = position();
        assert_eq!(p.effective_stop_loss_pct(&defaults), 20.0);
        assert_eq!(p.effective_take_profit_pct(&defaults), 50.0);
        assert_eq!(p.effective_max_hold_hours(&defaults), 72.0);

        p.stop_loss_pct = Some(12.0);
        p.take_profit_pct = Some(35.0);
        p.max_hold_hours = Some(6.0);
        assert_eq!(p.effective_stop_loss_pct(&defaults), 12.0);
        assert_eq!(p.effective_take_profit_pct(&defaults), 35.0);
        assert_eq!(p.effective_max_hold_hours(&defaults), 6.0);
    }

    #[test]
    fn test_pnl_pct() {
        let p = position();
        assert_relative_eq!(p.pnl_pct(1.55), 55.0, epsilon = 1e-9);
        assert_relative_eq!(p.pnl_pct(0.79), -21.0, epsilon = 1e-9);
    }

    #[test]
    fn test_generated_ids_are_distinct() {
        let now = Utc::now();
        let a = generate_position_id(now);
        let b = generate_position_id(now);
        assert!(a.starts_with("pos-"));
        assert_ne!(a, b);
    }
}
