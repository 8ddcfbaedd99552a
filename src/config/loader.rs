//! Configuration Loader
//!
//! Loads and validates configuration from TOML files matching config.toml structure.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::application::lifecycle::LifecycleConfig;
use crate::application::orchestrator::OrchestratorConfig;
use crate::domain::position::RiskDefaults;
use crate::strategy::selector::SelectorConfig;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scanner: ScannerSection,
    #[serde(default)]
    pub strategy: StrategySection,
    pub entry: EntrySection,
    pub risk: RiskSection,
    pub endpoints: EndpointsSection,
    pub tokens: TokensSection,
    #[serde(default)]
    pub store: StoreSection,
    pub logging: LoggingSection,
    #[serde(default)]
    pub alerts: AlertsSection,
}

/// Pool scanning configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct ScannerSection {
    /// Number of pools to pull per scan
    pub pool_limit: usize,
    /// Feed sort key: "volume", "tvl", "fees"
    pub sort_key: String,
    /// Optional feed-side tag filter (e.g. "memecoin")
    #[serde(default)]
    pub filter_tag: Option<String>,
    /// Seconds between discovery passes
    pub discovery_interval_secs: u64,
    /// Seconds between monitoring sweeps
    pub monitor_interval_secs: u64,
    /// Tickers treated as major assets
    #[serde(default = "default_majors")]
    pub majors: Vec<String>,
}

fn default_majors() -> Vec<String> {
    vec![
        "SOL".to_string(),
        "USDC".to_string(),
        "USDT".to_string(),
        "JITOSOL".to_string(),
        "MSOL".to_string(),
    ]
}

/// Strategy tuning section
#[derive(Debug, Clone, Deserialize)]
pub struct StrategySection {
    /// Hard cap on the entry half-width in bins
    pub max_bin_range: u32,
    /// Cooldown floor applied under very high volatility, in seconds
    pub min_rebalance_cooldown_secs: u64,
}

impl Default for StrategySection {
    fn default() -> Self {
        Self {
            max_bin_range: 69,
            min_rebalance_cooldown_secs: 300,
        }
    }
}

/// Entry sizing configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct EntrySection {
    /// Base asset committed per position, in whole units
    pub capital_per_position: f64,
    /// Minimum viable entry, in whole base units
    pub min_capital: f64,
    /// Concurrent position cap
    pub max_open_positions: usize,
    /// Abort entry when pool and oracle prices diverge beyond this percent
    pub max_price_divergence_pct: f64,
    /// Swap slippage tolerance in basis points
    pub slippage_bps: u16,
    /// Record positions without moving funds
    #[serde(default = "default_true")]
    pub simulate: bool,
}

fn default_true() -> bool {
    true
}

/// Risk management configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct RiskSection {
    /// Account-default stop loss percentage
    pub stop_loss_pct: f64,
    /// Account-default take profit percentage
    pub take_profit_pct: f64,
    /// Account-default maximum hold time in hours
    pub max_hold_hours: f64,
    /// Maximum daily realized loss as a percent of active capital
    pub max_daily_loss_pct: f64,
    /// Liquidate everything and halt when the daily limit trips
    #[serde(default = "default_true")]
    pub halt_on_daily_loss: bool,
}

/// External API configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct EndpointsSection {
    /// Meteora DLMM API base URL
    pub meteora_api_url: String,
    /// Jupiter price API base URL
    pub jupiter_price_url: String,
    /// Jupiter token search API base URL
    #[serde(default = "default_token_url")]
    pub jupiter_token_url: String,
}

fn default_token_url() -> String {
    "https://lite-api.jup.ag/tokens/v2".to_string()
}

/// Tokens configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct TokensSection {
    /// Base settlement asset mint (SOL)
    pub base_mint: String,
}

/// Record store configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// JSON state file path, tilde-expanded
    pub path: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: "~/.dlmm-ranger/state.json".to_string(),
        }
    }
}

impl StoreSection {
    /// Store path with the home directory expanded
    pub fn expanded_path(&self) -> String {
        shellexpand::tilde(&self.path).into_owned()
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

/// Alerts configuration section (optional)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AlertsSection {
    /// Enable Discord webhook notifications
    #[serde(default)]
    pub discord_enabled: bool,
    /// Discord webhook URL
    #[serde(default)]
    pub discord_webhook_url: String,
}

impl AlertsSection {
    /// Webhook URL with environment variable fallback
    /// Checks DISCORD_WEBHOOK_URL env var if config value is empty
    pub fn get_webhook_url(&self) -> Option<String> {
        if !self.discord_webhook_url.is_empty() {
            return Some(self.discord_webhook_url.clone());
        }
        std::env::var("DISCORD_WEBHOOK_URL").ok()
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate scanner section
        if self.scanner.pool_limit == 0 {
            return Err(ConfigError::ValidationError(
                "pool_limit must be > 0".to_string(),
            ));
        }

        if self.scanner.discovery_interval_secs == 0 || self.scanner.monitor_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "scan intervals must be > 0".to_string(),
            ));
        }

        // Validate strategy section
        if self.strategy.max_bin_range == 0 {
            return Err(ConfigError::ValidationError(
                "max_bin_range must be > 0".to_string(),
            ));
        }

        // Validate entry section
        if self.entry.capital_per_position <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "capital_per_position must be > 0, got {}",
                self.entry.capital_per_position
            )));
        }

        if self.entry.min_capital <= 0.0 || self.entry.min_capital > self.entry.capital_per_position
        {
            return Err(ConfigError::ValidationError(format!(
                "min_capital must be in (0, capital_per_position], got {}",
                self.entry.min_capital
            )));
        }

        if self.entry.max_open_positions == 0 {
            return Err(ConfigError::ValidationError(
                "max_open_positions must be > 0".to_string(),
            ));
        }

        if self.entry.max_price_divergence_pct <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "max_price_divergence_pct must be > 0, got {}",
                self.entry.max_price_divergence_pct
            )));
        }

        // Validate risk section
        if self.risk.stop_loss_pct <= 0.0 || self.risk.stop_loss_pct > 100.0 {
            return Err(ConfigError::ValidationError(format!(
                "stop_loss_pct must be 0-100, got {}",
                self.risk.stop_loss_pct
            )));
        }

        if self.risk.take_profit_pct <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "take_profit_pct must be > 0, got {}",
                self.risk.take_profit_pct
            )));
        }

        if self.risk.max_hold_hours <= 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "max_hold_hours must be > 0, got {}",
                self.risk.max_hold_hours
            )));
        }

        if self.risk.max_daily_loss_pct <= 0.0 || self.risk.max_daily_loss_pct > 100.0 {
            return Err(ConfigError::ValidationError(format!(
                "max_daily_loss_pct must be 0-100, got {}",
                self.risk.max_daily_loss_pct
            )));
        }

        // Validate endpoints
        if self.endpoints.meteora_api_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "meteora_api_url cannot be empty".to_string(),
            ));
        }

        if self.endpoints.jupiter_price_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "jupiter_price_url cannot be empty".to_string(),
            ));
        }

        // Validate tokens
        if self.tokens.base_mint.is_empty() {
            return Err(ConfigError::ValidationError(
                "base_mint cannot be empty".to_string(),
            ));
        }

        // Validate alerts
        if self.alerts.discord_enabled && self.alerts.get_webhook_url().is_none() {
            return Err(ConfigError::ValidationError(
                "discord_enabled requires a webhook URL".to_string(),
            ));
        }

        Ok(())
    }

    pub fn risk_defaults(&self) -> RiskDefaults {
        RiskDefaults {
            stop_loss_pct: self.risk.stop_loss_pct,
            take_profit_pct: self.risk.take_profit_pct,
            max_hold_hours: self.risk.max_hold_hours,
        }
    }
}

// Conversion from Config to SelectorConfig
impl From<&Config> for SelectorConfig {
    fn from(config: &Config) -> Self {
        SelectorConfig {
            majors: config.scanner.majors.clone(),
            max_bin_range: config.strategy.max_bin_range,
            min_rebalance_cooldown_secs: config.strategy.min_rebalance_cooldown_secs,
        }
    }
}

// Conversion from Config to LifecycleConfig
impl From<&Config> for LifecycleConfig {
    fn from(config: &Config) -> Self {
        LifecycleConfig {
            base_mint: config.tokens.base_mint.clone(),
            max_price_divergence_pct: config.entry.max_price_divergence_pct,
            slippage_bps: config.entry.slippage_bps,
            min_capital_lamports: (config.entry.min_capital * 1e9) as u64,
            simulate: config.entry.simulate,
            defaults: config.risk_defaults(),
        }
    }
}

// Conversion from Config to OrchestratorConfig
impl From<&Config> for OrchestratorConfig {
    fn from(config: &Config) -> Self {
        OrchestratorConfig {
            pool_limit: config.scanner.pool_limit,
            sort_key: config.scanner.sort_key.clone(),
            filter_tag: config.scanner.filter_tag.clone(),
            discovery_interval_secs: config.scanner.discovery_interval_secs,
            monitor_interval_secs: config.scanner.monitor_interval_secs,
            max_open_positions: config.entry.max_open_positions,
            capital_per_position_lamports: (config.entry.capital_per_position * 1e9) as u64,
            halt_on_daily_loss: config.risk.halt_on_daily_loss,
            selector: SelectorConfig::from(config),
        }
    }
}
