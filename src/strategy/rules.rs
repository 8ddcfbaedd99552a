//! Base Strategy Rule Table
//!
//! Ordered, data-driven mapping from market condition to base preset.
//! A downtrend short-circuits to SKIP before any rule is consulted. Within
//! a category, rules match top to bottom and the first match wins; every
//! category ends in a wildcard catch-all, which together with the downtrend
//! gate makes the table total over all condition tuples.

use crate::domain::condition::{
    MarketCondition, PriceTrend, TokenCategory, Volatility, VolumeLevel,
};

use super::presets::{
    StrategyPreset, ALT_BALANCED, ALT_HARVEST, HFL_SNIPER, LAUNCH_WIDE, MAJOR_CARPET, MAJOR_RIDER,
    MEME_GUARD, MEME_SCALPER, SKIP,
};

/// One predicate -> preset pair. `None` fields are wildcards.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub category: TokenCategory,
    pub volatility: Option<Volatility>,
    pub volume: Option<VolumeLevel>,
    pub trend: Option<PriceTrend>,
    pub preset: StrategyPreset,
    pub note: &'static str,
}

impl Rule {
    fn matches(&self, condition: &MarketCondition) -> bool {
        self.category == condition.token_category
            && self.volatility.map_or(true, |v| v == condition.volatility)
            && self.volume.map_or(true, |v| v == condition.volume)
            && self.trend.map_or(true, |t| t == condition.price_trend)
    }
}

/// Ordered base rule table. First match wins within each category.
pub const BASE_RULES: &[Rule] = &[
    // New launches: snipe real flow while price holds, otherwise stay out
    Rule {
        category: TokenCategory::NewLaunch,
        volatility: None,
        volume: Some(VolumeLevel::VeryHigh),
        trend: Some(PriceTrend::Sideways),
        preset: HFL_SNIPER,
        note: "fresh launch with heavy sideways flow, tight fee sniping",
    },
    Rule {
        category: TokenCategory::NewLaunch,
        volatility: None,
        volume: Some(VolumeLevel::High),
        trend: Some(PriceTrend::Sideways),
        preset: HFL_SNIPER,
        note: "fresh launch with solid sideways flow, tight fee sniping",
    },
    Rule {
        category: TokenCategory::NewLaunch,
        volatility: None,
        volume: Some(VolumeLevel::VeryHigh),
        trend: Some(PriceTrend::Uptrend),
        preset: LAUNCH_WIDE,
        note: "launch running up on heavy volume, wide range to stay in play",
    },
    Rule {
        category: TokenCategory::NewLaunch,
        volatility: None,
        volume: Some(VolumeLevel::High),
        trend: Some(PriceTrend::Uptrend),
        preset: LAUNCH_WIDE,
        note: "launch trending up with solid volume, wide range entry",
    },
    Rule {
        category: TokenCategory::NewLaunch,
        volatility: None,
        volume: None,
        trend: None,
        preset: SKIP,
        note: "launch flow too thin to pay for the risk",
    },
    // Majors: ride uptrends, carpet calm or busy books, skip the rest
    Rule {
        category: TokenCategory::Major,
        volatility: None,
        volume: None,
        trend: Some(PriceTrend::Uptrend),
        preset: MAJOR_RIDER,
        note: "major in an uptrend, momentum range",
    },
    Rule {
        category: TokenCategory::Major,
        volatility: None,
        volume: Some(VolumeLevel::VeryHigh),
        trend: None,
        preset: MAJOR_CARPET,
        note: "major with very high turnover, wide passive carpet",
    },
    Rule {
        category: TokenCategory::Major,
        volatility: None,
        volume: Some(VolumeLevel::High),
        trend: None,
        preset: MAJOR_CARPET,
        note: "major with high turnover, wide passive carpet",
    },
    Rule {
        category: TokenCategory::Major,
        volatility: Some(Volatility::Low),
        volume: None,
        trend: None,
        preset: MAJOR_CARPET,
        note: "calm major, wide passive carpet",
    },
    Rule {
        category: TokenCategory::Major,
        volatility: None,
        volume: None,
        trend: None,
        preset: SKIP,
        note: "volatile major without the volume to fund fees",
    },
    // Altcoins: only enter where turnover justifies the inventory risk
    Rule {
        category: TokenCategory::Altcoin,
        volatility: None,
        volume: Some(VolumeLevel::VeryHigh),
        trend: None,
        preset: ALT_HARVEST,
        note: "altcoin turning over above its own liquidity, harvest fees",
    },
    Rule {
        category: TokenCategory::Altcoin,
        volatility: None,
        volume: Some(VolumeLevel::High),
        trend: None,
        preset: ALT_BALANCED,
        note: "altcoin with healthy volume, balanced range",
    },
    Rule {
        category: TokenCategory::Altcoin,
        volatility: Some(Volatility::Low),
        volume: None,
        trend: Some(PriceTrend::Uptrend),
        preset: ALT_BALANCED,
        note: "quiet altcoin drifting up, balanced range",
    },
    Rule {
        category: TokenCategory::Altcoin,
        volatility: None,
        volume: None,
        trend: None,
        preset: SKIP,
        note: "altcoin volume too low to cover impermanent loss",
    },
    // Memecoins: demand extreme turnover, guard everything else with volume
    Rule {
        category: TokenCategory::Memecoin,
        volatility: None,
        volume: Some(VolumeLevel::VeryHigh),
        trend: None,
        preset: MEME_SCALPER,
        note: "memecoin in full churn, tight scalp range",
    },
    Rule {
        category: TokenCategory::Memecoin,
        volatility: None,
        volume: Some(VolumeLevel::High),
        trend: None,
        preset: MEME_GUARD,
        note: "memecoin with decent flow, defensive wide range",
    },
    Rule {
        category: TokenCategory::Memecoin,
        volatility: None,
        volume: None,
        trend: None,
        preset: SKIP,
        note: "memecoin without flow is pure downside",
    },
];

/// Resolve the base preset for a condition. Total: every tuple resolves,
/// possibly to SKIP.
pub fn lookup(condition: &MarketCondition) -> (StrategyPreset, &'static str) {
    if condition.price_trend == PriceTrend::Downtrend {
        return (SKIP, "downtrend, never provide liquidity into falling price");
    }
    for rule in BASE_RULES {
        if rule.matches(condition) {
            return (rule.preset, rule.note);
        }
    }
    // Unreachable while each category keeps its catch-all, but the table
    // stays total even if one is dropped
    (SKIP, "no rule matched this condition")
}
