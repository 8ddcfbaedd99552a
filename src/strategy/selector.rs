//! Strategy Selector
//!
//! Pure mapping from a pool snapshot to a concrete entry plan, in four
//! stages: base rule lookup, risk mitigation, range sizing, confidence
//! scoring. Also ranks a batch of decisions for execution ordering.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::condition::{
    classify, MarketCondition, PriceTrend, TokenCategory, Volatility, VolumeLevel, VolumeTrend,
};
use crate::domain::pool::PoolSnapshot;

use super::presets::{RebalanceDirection, StrategyPreset};
use super::rules;

/// Confidence points at or above this report high
const HIGH_CONFIDENCE_SCORE: u32 = 6;
/// Confidence points at or above this report medium
const MEDIUM_CONFIDENCE_SCORE: u32 = 3;

/// Selector tuning, sourced from config
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Tickers treated as major assets
    pub majors: Vec<String>,
    /// Hard cap on the mitigated half-width in bins
    pub max_bin_range: u32,
    /// Cooldown floor applied under very high volatility
    pub min_rebalance_cooldown_secs: u64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            majors: vec![
                "SOL".to_string(),
                "USDC".to_string(),
                "USDT".to_string(),
                "JITOSOL".to_string(),
                "MSOL".to_string(),
            ],
            max_bin_range: 69,
            min_rebalance_cooldown_secs: 300,
        }
    }
}

/// Entry range as bin offsets from the active bin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRange {
    pub lower: i32,
    pub upper: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Action {
    Enter,
    Skip,
}

/// Selector output: the full entry plan for one pool
#[derive(Debug, Clone, Serialize)]
pub struct StrategyDecision {
    pub pool_address: String,
    pub pool_name: String,
    pub action: Action,
    pub preset: StrategyPreset,
    pub condition: MarketCondition,
    pub range: EntryRange,
    pub rationale: String,
    pub confidence: Confidence,
    /// Carried for batch ranking
    pub fee_tvl_ratio: f64,
}

/// Map one snapshot to an entry plan
pub fn select(
    snapshot: &PoolSnapshot,
    config: &SelectorConfig,
    now: DateTime<Utc>,
) -> StrategyDecision {
    let condition = classify(snapshot, &config.majors, now);
    let (base, note) = rules::lookup(&condition);

    if base.is_skip() {
        // Skip decisions are always fully confident: not entering is safe
        return StrategyDecision {
            pool_address: snapshot.address.clone(),
            pool_name: snapshot.name.clone(),
            action: Action::Skip,
            preset: base,
            condition,
            range: EntryRange { lower: 0, upper: 0 },
            rationale: note.to_string(),
            confidence: Confidence::High,
            fee_tvl_ratio: snapshot.fee_tvl_ratio(),
        };
    }

    let (mitigated, mitigation_notes) = mitigate(base, &condition, config);
    let range = size_range(mitigated.bin_range, snapshot, config.max_bin_range);
    let (score, confidence) = score_confidence(snapshot, &condition);

    let mut rationale = format!("{} [{}]", note, condition.label());
    if !mitigation_notes.is_empty() {
        rationale.push_str(&format!("; mitigations: {}", mitigation_notes.join(", ")));
    }
    rationale.push_str(&format!("; confidence score {}", score));

    StrategyDecision {
        pool_address: snapshot.address.clone(),
        pool_name: snapshot.name.clone(),
        action: Action::Enter,
        preset: mitigated,
        condition,
        range,
        rationale,
        confidence,
        fee_tvl_ratio: snapshot.fee_tvl_ratio(),
    }
}

/// Stage 2: copy the preset and tighten it for the observed conditions
fn mitigate(
    base: StrategyPreset,
    condition: &MarketCondition,
    config: &SelectorConfig,
) -> (StrategyPreset, Vec<&'static str>) {
    let mut preset = base;
    let mut notes = Vec::new();

    if matches!(condition.volatility, Volatility::High | Volatility::VeryHigh) {
        preset.bin_range = (preset.bin_range * 2).min(config.max_bin_range);
        notes.push("doubled range for volatility");
    }

    if condition.volatility == Volatility::VeryHigh && preset.rebalance_cooldown_secs == 0 {
        preset.rebalance_cooldown_secs = config.min_rebalance_cooldown_secs;
        notes.push("raised rebalance cooldown");
    }

    if condition.token_category == TokenCategory::Major
        && condition.price_trend == PriceTrend::Uptrend
    {
        preset.rebalance = RebalanceDirection::UpOnly;
        notes.push("up-only rebalance on trending major");
    }

    if condition.volatility != Volatility::Low && !preset.stop_loss_enabled {
        preset.stop_loss_enabled = true;
        notes.push("forced stop loss");
    }

    (preset, notes)
}

/// Stage 3: widen the symmetric range to cover the expected daily swing.
/// The configured bin cap bounds the final half-width no matter which
/// stage produced it, so swing widening can never exceed it either.
fn size_range(base_bins: u32, snapshot: &PoolSnapshot, max_bins: u32) -> EntryRange {
    let mut bins = base_bins;

    let swing_4h = snapshot.price_change_4h_pct.abs();
    if swing_4h > 0.0 && snapshot.bin_step > 0 {
        // Expected daily swing is twice the 4h swing; the range must cover
        // half of it on each side
        let half_swing_pct = swing_4h * 2.0 / 2.0;
        let needed = (half_swing_pct / snapshot.bin_step_pct()).ceil() as u32;
        bins = bins.max(needed);
    }

    let bins = bins.min(max_bins) as i32;
    EntryRange {
        lower: -bins,
        upper: bins,
    }
}

/// Stage 4: additive confidence points from signal availability and
/// favorable combinations
fn score_confidence(snapshot: &PoolSnapshot, condition: &MarketCondition) -> (u32, Confidence) {
    let mut score = 0;

    if snapshot.price > 0.0 && snapshot.liquidity_usd > 0.0 {
        score += 2; // core metrics complete
    }
    if snapshot.created_at.is_some() {
        score += 1;
    }
    if snapshot.holder_count.is_some() {
        score += 1;
    }
    if snapshot.volume_1h > 0.0 {
        score += 1;
    }
    if condition.volatility == Volatility::Low
        && matches!(condition.volume, VolumeLevel::High | VolumeLevel::VeryHigh)
    {
        score += 2; // the best regime for passive liquidity
    }
    if condition.volume_trend == VolumeTrend::Increasing {
        score += 1;
    }
    if snapshot.organic_score.map_or(false, |s| s > 0.5) {
        score += 1;
    }

    let confidence = if score >= HIGH_CONFIDENCE_SCORE {
        Confidence::High
    } else if score >= MEDIUM_CONFIDENCE_SCORE {
        Confidence::Medium
    } else {
        Confidence::Low
    };
    (score, confidence)
}

/// Order a batch for display and execution: entries before skips, higher
/// confidence first, ties broken by fee yield density
pub fn rank(decisions: &mut [StrategyDecision]) {
    decisions.sort_by(|a, b| {
        a.action
            .cmp(&b.action)
            .then(a.confidence.cmp(&b.confidence))
            .then(b.fee_tvl_ratio.total_cmp(&a.fee_tvl_ratio))
    });
}
