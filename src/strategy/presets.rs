//! Strategy Presets
//!
//! Named, immutable parameter bundles for DLMM entries. Mitigation never
//! mutates these table entries; it copies a preset and adjusts the copy.

use serde::{Deserialize, Serialize};

/// Liquidity distribution shape across the position's bins
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LiquidityShape {
    /// Uniform across the range
    Spot,
    /// Concentrated around the active bin
    Curve,
    /// Weighted toward the range edges
    BidAsk,
}

/// Which direction the position may be rebalanced toward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RebalanceDirection {
    Both,
    UpOnly,
    DownOnly,
}

/// Immutable entry parameter bundle
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StrategyPreset {
    pub name: &'static str,
    /// Half-width of the position range, in bins
    pub bin_range: u32,
    pub shape: LiquidityShape,
    pub rebalance: RebalanceDirection,
    pub rebalance_cooldown_secs: u64,
    pub stop_loss_enabled: bool,
    pub single_sided: bool,
    pub auto_compound: bool,
    pub take_profit_pct: Option<f64>,
    pub stop_loss_pct: Option<f64>,
    pub max_hold_hours: Option<f64>,
}

impl StrategyPreset {
    pub fn is_skip(&self) -> bool {
        self.name == SKIP.name
    }
}

/// Reserved preset meaning "do not enter"
pub const SKIP: StrategyPreset = StrategyPreset {
    name: "SKIP",
    bin_range: 0,
    shape: LiquidityShape::Spot,
    rebalance: RebalanceDirection::Both,
    rebalance_cooldown_secs: 0,
    stop_loss_enabled: false,
    single_sided: false,
    auto_compound: false,
    take_profit_pct: None,
    stop_loss_pct: None,
    max_hold_hours: None,
};

/// Tight range fee sniping on fresh launches with real flow
pub const HFL_SNIPER: StrategyPreset = StrategyPreset {
    name: "HFL_SNIPER",
    bin_range: 5,
    shape: LiquidityShape::Spot,
    rebalance: RebalanceDirection::Both,
    rebalance_cooldown_secs: 0,
    stop_loss_enabled: true,
    single_sided: false,
    auto_compound: true,
    take_profit_pct: Some(40.0),
    stop_loss_pct: Some(15.0),
    max_hold_hours: Some(6.0),
};

/// Wider launch entry when price is already running up
pub const LAUNCH_WIDE: StrategyPreset = StrategyPreset {
    name: "LAUNCH_WIDE",
    bin_range: 15,
    shape: LiquidityShape::Curve,
    rebalance: RebalanceDirection::Both,
    rebalance_cooldown_secs: 600,
    stop_loss_enabled: true,
    single_sided: false,
    auto_compound: false,
    take_profit_pct: Some(60.0),
    stop_loss_pct: Some(25.0),
    max_hold_hours: Some(12.0),
};

/// Passive wide carpet on blue-chip pairs
pub const MAJOR_CARPET: StrategyPreset = StrategyPreset {
    name: "MAJOR_CARPET",
    bin_range: 30,
    shape: LiquidityShape::Curve,
    rebalance: RebalanceDirection::Both,
    rebalance_cooldown_secs: 1800,
    stop_loss_enabled: false,
    single_sided: false,
    auto_compound: true,
    take_profit_pct: None,
    stop_loss_pct: None,
    max_hold_hours: None,
};

/// Momentum-following range on a trending major
pub const MAJOR_RIDER: StrategyPreset = StrategyPreset {
    name: "MAJOR_RIDER",
    bin_range: 12,
    shape: LiquidityShape::BidAsk,
    rebalance: RebalanceDirection::Both,
    rebalance_cooldown_secs: 900,
    stop_loss_enabled: true,
    single_sided: false,
    auto_compound: false,
    take_profit_pct: Some(25.0),
    stop_loss_pct: Some(12.0),
    max_hold_hours: Some(72.0),
};

/// Balanced mid-width range for established altcoins
pub const ALT_BALANCED: StrategyPreset = StrategyPreset {
    name: "ALT_BALANCED",
    bin_range: 20,
    shape: LiquidityShape::Curve,
    rebalance: RebalanceDirection::Both,
    rebalance_cooldown_secs: 1200,
    stop_loss_enabled: true,
    single_sided: false,
    auto_compound: false,
    take_profit_pct: Some(35.0),
    stop_loss_pct: Some(18.0),
    max_hold_hours: Some(48.0),
};

/// Tight fee harvesting when altcoin turnover is extreme
pub const ALT_HARVEST: StrategyPreset = StrategyPreset {
    name: "ALT_HARVEST",
    bin_range: 10,
    shape: LiquidityShape::Spot,
    rebalance: RebalanceDirection::Both,
    rebalance_cooldown_secs: 600,
    stop_loss_enabled: true,
    single_sided: false,
    auto_compound: true,
    take_profit_pct: Some(30.0),
    stop_loss_pct: Some(15.0),
    max_hold_hours: Some(24.0),
};

/// Narrow scalp on heavily traded memecoins
pub const MEME_SCALPER: StrategyPreset = StrategyPreset {
    name: "MEME_SCALPER",
    bin_range: 8,
    shape: LiquidityShape::Spot,
    rebalance: RebalanceDirection::Both,
    rebalance_cooldown_secs: 300,
    stop_loss_enabled: true,
    single_sided: false,
    auto_compound: true,
    take_profit_pct: Some(50.0),
    stop_loss_pct: Some(20.0),
    max_hold_hours: Some(12.0),
};

/// Defensive wider memecoin range with edge weighting
pub const MEME_GUARD: StrategyPreset = StrategyPreset {
    name: "MEME_GUARD",
    bin_range: 25,
    shape: LiquidityShape::BidAsk,
    rebalance: RebalanceDirection::Both,
    rebalance_cooldown_secs: 900,
    stop_loss_enabled: true,
    single_sided: false,
    auto_compound: false,
    take_profit_pct: Some(40.0),
    stop_loss_pct: Some(15.0),
    max_hold_hours: Some(24.0),
};
