//! Market Condition Classifier
//!
//! Pure, total functions that turn raw pool metrics into categorical market
//! conditions. No side effects, defined for all inputs; missing metrics fall
//! back to the neutral bucket rather than erroring.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::pool::PoolSnapshot;

/// Volatility threshold: absolute 4h swing above this is very high
const VERY_HIGH_SWING_PCT: f64 = 15.0;
/// Volatility threshold: absolute 4h swing above this is high
const HIGH_SWING_PCT: f64 = 5.0;
/// Pool age below this is a new launch
const NEW_LAUNCH_AGE_HOURS: f64 = 24.0;
/// Pool age below this can still be a memecoin
const MEMECOIN_AGE_HOURS: f64 = 14.0 * 24.0;
/// Holder count below this (with young age) classifies as memecoin
const MEMECOIN_MAX_HOLDERS: u64 = 5000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Volatility {
    Low,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeLevel {
    Low,
    High,
    VeryHigh,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenCategory {
    Major,
    Altcoin,
    Memecoin,
    NewLaunch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceTrend {
    Uptrend,
    Sideways,
    Downtrend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeTrend {
    Increasing,
    Stable,
    Decreasing,
}

impl fmt::Display for Volatility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Volatility::Low => "low",
            Volatility::High => "high",
            Volatility::VeryHigh => "very_high",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for VolumeLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VolumeLevel::Low => "low",
            VolumeLevel::High => "high",
            VolumeLevel::VeryHigh => "very_high",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for TokenCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenCategory::Major => "major",
            TokenCategory::Altcoin => "altcoin",
            TokenCategory::Memecoin => "memecoin",
            TokenCategory::NewLaunch => "new_launch",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for PriceTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PriceTrend::Uptrend => "uptrend",
            PriceTrend::Sideways => "sideways",
            PriceTrend::Downtrend => "downtrend",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for VolumeTrend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            VolumeTrend::Increasing => "increasing",
            VolumeTrend::Stable => "stable",
            VolumeTrend::Decreasing => "decreasing",
        };
        write!(f, "{}", s)
    }
}

/// Categorical market condition derived from a pool snapshot.
/// Ephemeral per decision, no persisted identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketCondition {
    pub volatility: Volatility,
    pub volume: VolumeLevel,
    pub token_category: TokenCategory,
    pub price_trend: PriceTrend,
    pub volume_trend: VolumeTrend,
}

impl MarketCondition {
    /// Short label for decision logs, e.g. "memecoin/high/very_high/uptrend"
    pub fn label(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            self.token_category, self.volatility, self.volume, self.price_trend
        )
    }
}

/// Classify all dimensions of a snapshot at once
pub fn classify(snapshot: &PoolSnapshot, majors: &[String], now: DateTime<Utc>) -> MarketCondition {
    MarketCondition {
        volatility: classify_volatility(snapshot),
        volume: classify_volume_level(snapshot),
        token_category: classify_token_category(snapshot, majors, now),
        price_trend: classify_price_trend(snapshot),
        volume_trend: classify_volume_trend(snapshot),
    }
}

/// Volatility from the 4h price swing, falling back to the short/medium
/// volume-rate ratio when no swing is observed
pub fn classify_volatility(snapshot: &PoolSnapshot) -> Volatility {
    let swing = snapshot.price_change_4h_pct.abs();
    if snapshot.price_change_4h_pct != 0.0 {
        if swing > VERY_HIGH_SWING_PCT {
            Volatility::VeryHigh
        } else if swing > HIGH_SWING_PCT {
            Volatility::High
        } else {
            Volatility::Low
        }
    } else {
        let ratio = if snapshot.volume_rate_4h > 0.0 {
            snapshot.volume_rate_30m / snapshot.volume_rate_4h
        } else {
            0.0
        };
        if ratio > 3.0 {
            Volatility::VeryHigh
        } else if ratio > 1.5 {
            Volatility::High
        } else {
            Volatility::Low
        }
    }
}

/// Volume level as 1h volume relative to value locked
pub fn classify_volume_level(snapshot: &PoolSnapshot) -> VolumeLevel {
    if snapshot.liquidity_usd <= 0.0 {
        return VolumeLevel::Low;
    }
    let ratio = snapshot.volume_1h / snapshot.liquidity_usd;
    if ratio > 1.0 {
        VolumeLevel::VeryHigh
    } else if ratio > 0.2 {
        VolumeLevel::High
    } else {
        VolumeLevel::Low
    }
}

/// Token category in fixed priority order: new launch, major allowlist,
/// memecoin heuristic, then altcoin.
///
/// A pool is a major only when every ticker in its name is on the allowlist,
/// so "WIF-SOL" does not ride on SOL's status. An unknown holder count never
/// classifies as memecoin.
pub fn classify_token_category(
    snapshot: &PoolSnapshot,
    majors: &[String],
    now: DateTime<Utc>,
) -> TokenCategory {
    let age = snapshot.age_hours(now);

    if let Some(age_hours) = age {
        if age_hours < NEW_LAUNCH_AGE_HOURS {
            return TokenCategory::NewLaunch;
        }
    }

    if is_major_pair(&snapshot.name, majors) {
        return TokenCategory::Major;
    }

    if let (Some(age_hours), Some(holders)) = (age, snapshot.holder_count) {
        if age_hours < MEMECOIN_AGE_HOURS && holders < MEMECOIN_MAX_HOLDERS {
            return TokenCategory::Memecoin;
        }
    }

    TokenCategory::Altcoin
}

/// Price trend from the 4h change, or the doubled 1h change when 4h is flat
pub fn classify_price_trend(snapshot: &PoolSnapshot) -> PriceTrend {
    let change = if snapshot.price_change_4h_pct != 0.0 {
        snapshot.price_change_4h_pct
    } else {
        snapshot.price_change_1h_pct * 2.0
    };
    if change < -10.0 {
        PriceTrend::Downtrend
    } else if change > 5.0 {
        PriceTrend::Uptrend
    } else {
        PriceTrend::Sideways
    }
}

/// Volume trend: 30-minute rate against a 4h baseline (1h when 4h is empty)
pub fn classify_volume_trend(snapshot: &PoolSnapshot) -> VolumeTrend {
    let baseline = if snapshot.volume_rate_4h > 0.0 {
        snapshot.volume_rate_4h
    } else {
        snapshot.volume_rate_1h
    };
    if baseline <= 0.0 {
        return VolumeTrend::Stable;
    }
    let ratio = snapshot.volume_rate_30m / baseline;
    if ratio > 1.5 {
        VolumeTrend::Increasing
    } else if ratio < 0.5 {
        VolumeTrend::Decreasing
    } else {
        VolumeTrend::Stable
    }
}

fn is_major_pair(name: &str, majors: &[String]) -> bool {
    let tickers: Vec<&str> = name
        .split(['-', '/', ' '])
        .filter(|t| !t.is_empty())
        .collect();
    !tickers.is_empty()
        && tickers
            .iter()
            .all(|t| majors.iter().any(|m| m.eq_ignore_ascii_case(t)))
}
