//! DLMM Ranger - concentrated liquidity position manager for Meteora DLMM
//!
//! Scans pools, classifies conditions, selects range strategies, and
//! manages position lifecycle with hard risk limits.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use dlmm_ranger::adapters::cli::{CliApp, Command, ExitAllCmd, RunCmd, ScanCmd};
use dlmm_ranger::adapters::{
    DiscordNotifier, JsonFileStore, JupiterPriceOracle, JupiterTokenClient, MeteoraClient,
    UnsignedExchange,
};
use dlmm_ranger::application::lifecycle::{LifecycleConfig, PositionManager};
use dlmm_ranger::application::monitor::{ExitMonitor, MonitorAction};
use dlmm_ranger::application::orchestrator::{Orchestrator, OrchestratorConfig};
use dlmm_ranger::config::{load_config, Config};
use dlmm_ranger::ports::market_data::PoolFeed;
use dlmm_ranger::strategy::selector::{self, Action, SelectorConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in config.toml)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    let config_path = match &app.command {
        Command::Run(cmd) => &cmd.config,
        Command::Scan(cmd) => &cmd.config,
        Command::Status(cmd) => &cmd.config,
        Command::ExitAll(cmd) => &cmd.config,
    };
    let config = load_config(config_path).context("Failed to load configuration")?;
    fmt()
        .with_env_filter(log_filter(app.verbose, app.debug, &config.logging.level))
        .init();

    match app.command {
        Command::Run(cmd) => run_command(cmd, config).await,
        Command::Scan(cmd) => scan_command(cmd, config).await,
        Command::Status(_) => status_command(config).await,
        Command::ExitAll(cmd) => exit_all_command(cmd, config).await,
    }
}

/// CLI flags win over RUST_LOG, which wins over the configured level
fn log_filter(verbose: bool, debug: bool, config_level: &str) -> EnvFilter {
    if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config_level))
    }
}

/// Wire the full engine stack from configuration
async fn build_engine(config: &Config, force_paper: bool) -> Result<Arc<Orchestrator>> {
    let meteora = Arc::new(
        MeteoraClient::new(&config.endpoints.meteora_api_url)
            .context("Failed to create Meteora client")?,
    );
    let oracle = Arc::new(
        JupiterPriceOracle::new(&config.endpoints.jupiter_price_url, &config.tokens.base_mint)
            .context("Failed to create price oracle")?,
    );
    let enrichment = Arc::new(
        JupiterTokenClient::new(&config.endpoints.jupiter_token_url)
            .context("Failed to create token client")?,
    );
    let store = Arc::new(
        JsonFileStore::open(config.store.expanded_path())
            .await
            .context("Failed to open record store")?,
    );
    let notifier = Arc::new(if config.alerts.discord_enabled {
        DiscordNotifier::new(config.alerts.get_webhook_url())
    } else {
        DiscordNotifier::disabled()
    });

    let mut lifecycle_config = LifecycleConfig::from(config);
    if force_paper {
        lifecycle_config.simulate = true;
    }
    if !lifecycle_config.simulate {
        tracing::warn!(
            "live mode configured but no transaction signer is wired in; \
             entries will fail until one is"
        );
    }

    let manager = Arc::new(PositionManager::new(
        oracle,
        Arc::new(UnsignedExchange),
        meteora.clone(),
        store.clone(),
        notifier.clone(),
        lifecycle_config,
    ));
    let monitor = ExitMonitor::new(
        manager.clone(),
        store.clone(),
        notifier,
        config.risk.max_daily_loss_pct,
    );

    Ok(Arc::new(Orchestrator::new(
        meteora,
        enrichment,
        manager,
        monitor,
        store,
        OrchestratorConfig::from(config),
    )))
}

async fn run_command(cmd: RunCmd, config: Config) -> Result<()> {
    let orchestrator = build_engine(&config, cmd.paper).await?;

    if cmd.paper || config.entry.simulate {
        tracing::warn!("SIMULATED MODE - no funds will move");
    }

    // Setup Ctrl+C handler
    let orch = orchestrator.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        orch.stop().await;
    });

    orchestrator.run().await;
    tracing::info!("DLMM Ranger stopped");
    Ok(())
}

async fn scan_command(cmd: ScanCmd, config: Config) -> Result<()> {
    let meteora =
        MeteoraClient::new(&config.endpoints.meteora_api_url).context("Failed to create client")?;

    let limit = cmd.limit.unwrap_or(config.scanner.pool_limit);
    let snapshots = meteora
        .fetch(
            limit,
            &config.scanner.sort_key,
            config.scanner.filter_tag.as_deref(),
        )
        .await
        .context("Pool scan failed")?;

    let selector_config = SelectorConfig::from(&config);
    let now = Utc::now();
    let mut decisions: Vec<_> = snapshots
        .iter()
        .map(|s| selector::select(s, &selector_config, now))
        .collect();
    selector::rank(&mut decisions);

    println!(
        "{:<24} {:<6} {:<14} {:<8} {}",
        "POOL", "ACT", "STRATEGY", "CONF", "RATIONALE"
    );
    for decision in &decisions {
        let action = match decision.action {
            Action::Enter => "enter",
            Action::Skip => "skip",
        };
        println!(
            "{:<24} {:<6} {:<14} {:<8} {}",
            decision.pool_name, action, decision.preset.name, decision.confidence, decision.rationale
        );
    }
    let entries = decisions.iter().filter(|d| d.action == Action::Enter).count();
    println!("\n{} pools scanned, {} entry candidates", decisions.len(), entries);
    Ok(())
}

async fn status_command(config: Config) -> Result<()> {
    use dlmm_ranger::ports::store::RecordStore;

    let store = JsonFileStore::open(config.store.expanded_path())
        .await
        .context("Failed to open record store")?;

    let active = store.active_positions().await?;
    let pnl_today = store.today_realized_pnl().await?;
    let capital = store.total_active_capital().await?;

    println!("Active positions: {}", active.len());
    for position in &active {
        println!(
            "  {} {} [{}] entry {:.4} SOL, bins {}..{}, fees {:.4}{}",
            position.id,
            position.pool_name,
            position.strategy,
            position.entry_amount,
            position.lower_bin,
            position.upper_bin,
            position.fees_earned,
            if position.simulated { " (sim)" } else { "" },
        );
    }
    println!("Active capital: {:.4} SOL", capital);
    println!("Realized pnl today: {:+.4} SOL", pnl_today);
    Ok(())
}

async fn exit_all_command(cmd: ExitAllCmd, config: Config) -> Result<()> {
    let orchestrator = build_engine(&config, false).await?;

    let actions = orchestrator.emergency_exit_all(&cmd.reason).await;
    if actions.is_empty() {
        println!("No active positions");
        return Ok(());
    }
    for action in &actions {
        match action {
            MonitorAction::Closed { id, pnl, .. } => {
                println!("closed {} pnl {:+.4} SOL", id, pnl);
            }
            MonitorAction::CloseFailed { id, error } => {
                println!("FAILED to close {}: {}", id, error);
            }
            MonitorAction::DailyLossBreach { .. } => {}
        }
    }
    Ok(())
}
