//! Strategy Layer - Condition-Driven Entry Planning
//!
//! Maps classified market conditions to concrete DLMM entry plans:
//! - `presets`: named immutable parameter bundles, including the reserved SKIP
//! - `rules`: ordered data-driven base rule table, total over all conditions
//! - `selector`: base lookup, risk mitigation, range sizing, confidence scoring

pub mod presets;
pub mod rules;
pub mod selector;

pub use presets::{LiquidityShape, RebalanceDirection, StrategyPreset, SKIP};
pub use rules::{lookup, Rule, BASE_RULES};
pub use selector::{
    rank, select, Action, Confidence, EntryRange, SelectorConfig, StrategyDecision,
};
