//! Domain Layer - Core business logic for the range manager
//!
//! Pure domain types and logic with no external dependencies. All external
//! interactions happen through the ports layer.
//!
//! - `pool`: immutable per-scan pool snapshot
//! - `condition`: market condition classifier (pure, total)
//! - `position`: position entity with guarded status transitions
//! - `risk`: exit threshold rules and the daily loss governor

pub mod pool;
pub mod condition;
pub mod position;
pub mod risk;

pub use pool::PoolSnapshot;
pub use condition::{
    classify, classify_price_trend, classify_token_category, classify_volatility,
    classify_volume_level, classify_volume_trend, MarketCondition, PriceTrend, TokenCategory,
    Volatility, VolumeLevel, VolumeTrend,
};
pub use position::{
    generate_position_id, DecisionAction, DecisionLogEntry, Position, PositionError,
    PositionStatus, RebalanceRecord, RiskDefaults,
};
pub use risk::{check_daily_loss, evaluate_exit, DailyLossCheck, ExitSignal};
