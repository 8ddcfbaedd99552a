//! Exit Rules and Daily Loss Governor
//!
//! Pure threshold evaluation shared by the exit monitor. Take-profit is
//! checked before stop-loss before max-hold; the first match wins. A
//! position that gaps past both thresholds in one tick therefore reports
//! a take-profit exit.

use chrono::{DateTime, Utc};

use super::position::{Position, RiskDefaults};

/// Exit signal for a single position
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ExitSignal {
    TakeProfit { pnl_pct: f64 },
    StopLoss { pnl_pct: f64 },
    MaxHoldTime { hours_held: f64 },
}

impl ExitSignal {
    /// Exit reason string recorded on the position
    pub fn reason(&self) -> &'static str {
        match self {
            ExitSignal::TakeProfit { .. } => "take_profit",
            ExitSignal::StopLoss { .. } => "stop_loss",
            ExitSignal::MaxHoldTime { .. } => "max_hold_time",
        }
    }
}

/// Evaluate exit thresholds for one position on one tick.
///
/// Take-profit and stop-loss need a live valuation; when `live_value` is
/// unavailable neither fires and only the max-hold check can trigger.
pub fn evaluate_exit(
    position: &Position,
    live_value: Option<f64>,
    defaults: &RiskDefaults,
    now: DateTime<Utc>,
) -> Option<ExitSignal> {
    if let Some(value) = live_value {
        let pnl_pct = position.pnl_pct(value);
        if pnl_pct >= position.effective_take_profit_pct(defaults) {
            return Some(ExitSignal::TakeProfit { pnl_pct });
        }
        if pnl_pct <= -position.effective_stop_loss_pct(defaults) {
            return Some(ExitSignal::StopLoss { pnl_pct });
        }
    }

    let hours_held = position.age_hours(now);
    if hours_held >= position.effective_max_hold_hours(defaults) {
        return Some(ExitSignal::MaxHoldTime { hours_held });
    }

    None
}

/// Outcome of the account-wide daily loss check
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyLossCheck {
    /// |today's realized pnl| over currently active capital, percent
    pub ratio_pct: f64,
    pub breached: bool,
}

/// Daily loss governor: breached when today's realized pnl is negative and
/// its magnitude meets or exceeds `max_daily_loss_pct` of active capital.
/// With no active capital there is nothing to protect and no breach.
pub fn check_daily_loss(
    today_realized_pnl: f64,
    total_active_capital: f64,
    max_daily_loss_pct: f64,
) -> DailyLossCheck {
    if today_realized_pnl >= 0.0 || total_active_capital <= 0.0 {
        return DailyLossCheck {
            ratio_pct: 0.0,
            breached: false,
        };
    }
    let ratio_pct = today_realized_pnl.abs() / total_active_capital * 100.0;
    DailyLossCheck {
        ratio_pct,
        breached: ratio_pct >= max_daily_loss_pct,
    }
}
