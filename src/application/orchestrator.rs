//! Orchestrator
//!
//! Single-task engine loop. Two timers share one task via select!, so a
//! discovery pass and a monitoring sweep never overlap and no per-position
//! locking is needed. Discovery scans the feed, classifies, selects, logs
//! every decision, and opens the best entries up to the position cap.
//! Monitoring delegates to the exit monitor and, when the daily loss
//! governor trips, liquidates everything and halts.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::pool::PoolSnapshot;
use crate::domain::position::{DecisionAction, DecisionLogEntry};
use crate::ports::market_data::{EnrichmentSource, PoolFeed};
use crate::ports::store::RecordStore;
use crate::strategy::selector::{self, Action, SelectorConfig, StrategyDecision};

use super::lifecycle::PositionManager;
use super::monitor::{ExitMonitor, MonitorAction};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub pool_limit: usize,
    pub sort_key: String,
    pub filter_tag: Option<String>,
    pub discovery_interval_secs: u64,
    pub monitor_interval_secs: u64,
    pub max_open_positions: usize,
    /// Base-asset raw units committed per entry
    pub capital_per_position_lamports: u64,
    /// Liquidate everything when the daily loss governor trips
    pub halt_on_daily_loss: bool,
    pub selector: SelectorConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            pool_limit: 50,
            sort_key: "volume".to_string(),
            filter_tag: None,
            discovery_interval_secs: 300,
            monitor_interval_secs: 60,
            max_open_positions: 3,
            capital_per_position_lamports: 1_000_000_000,
            halt_on_daily_loss: true,
            selector: SelectorConfig::default(),
        }
    }
}

pub struct Orchestrator {
    feed: Arc<dyn PoolFeed>,
    enrichment: Arc<dyn EnrichmentSource>,
    manager: Arc<PositionManager>,
    monitor: ExitMonitor,
    store: Arc<dyn RecordStore>,
    config: OrchestratorConfig,
    running: RwLock<bool>,
}

impl Orchestrator {
    pub fn new(
        feed: Arc<dyn PoolFeed>,
        enrichment: Arc<dyn EnrichmentSource>,
        manager: Arc<PositionManager>,
        monitor: ExitMonitor,
        store: Arc<dyn RecordStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            feed,
            enrichment,
            manager,
            monitor,
            store,
            config,
            running: RwLock::new(false),
        }
    }

    /// Classify and select for one snapshot
    pub fn evaluate(&self, snapshot: &PoolSnapshot) -> StrategyDecision {
        selector::select(snapshot, &self.config.selector, Utc::now())
    }

    pub async fn stop(&self) {
        *self.running.write().await = false;
        tracing::info!("stop requested");
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    /// Run until stopped. Both timers fire on one task, so ticks are
    /// strictly sequential.
    pub async fn run(&self) {
        *self.running.write().await = true;
        tracing::info!(
            discovery_secs = self.config.discovery_interval_secs,
            monitor_secs = self.config.monitor_interval_secs,
            "engine started"
        );

        let mut discovery =
            tokio::time::interval(Duration::from_secs(self.config.discovery_interval_secs));
        let mut monitoring =
            tokio::time::interval(Duration::from_secs(self.config.monitor_interval_secs));
        discovery.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        monitoring.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        // The third branch keeps stop() responsive between long ticks
        loop {
            if !self.is_running().await {
                break;
            }
            tokio::select! {
                _ = discovery.tick() => {
                    self.discovery_tick().await;
                }
                _ = monitoring.tick() => {
                    self.monitor_tick().await;
                }
                _ = tokio::time::sleep(Duration::from_millis(250)) => {}
            }
        }
        tracing::info!("engine stopped");
    }

    /// One discovery pass: scan, evaluate, audit, open the best entries
    pub async fn discovery_tick(&self) {
        let snapshots = match self
            .feed
            .fetch(
                self.config.pool_limit,
                &self.config.sort_key,
                self.config.filter_tag.as_deref(),
            )
            .await
        {
            Ok(snapshots) => snapshots,
            Err(err) => {
                tracing::warn!("pool scan failed, retrying next tick: {}", err);
                return;
            }
        };
        tracing::debug!(count = snapshots.len(), "scanned pools");

        let mut decisions = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            let snapshot = self.enrich(snapshot).await;
            let decision = self.evaluate(&snapshot);
            self.log_decision(&decision).await;
            decisions.push(decision);
        }
        selector::rank(&mut decisions);

        let (active_count, held_pools) = match self.store.active_positions().await {
            Ok(positions) => {
                let held: HashSet<String> =
                    positions.iter().map(|p| p.pool_address.clone()).collect();
                (positions.len(), held)
            }
            Err(err) => {
                tracing::warn!("cannot read active positions, skipping entries: {}", err);
                return;
            }
        };

        let mut open_slots = self
            .config
            .max_open_positions
            .saturating_sub(active_count);
        for decision in decisions
            .iter()
            .filter(|d| d.action == Action::Enter && !held_pools.contains(&d.pool_address))
        {
            if open_slots == 0 {
                break;
            }
            match self
                .manager
                .open(decision, self.config.capital_per_position_lamports)
                .await
            {
                Ok(id) => {
                    tracing::info!(
                        id = %id,
                        pool = %decision.pool_name,
                        strategy = %decision.preset.name,
                        confidence = %decision.confidence,
                        "entered position"
                    );
                    open_slots -= 1;
                }
                Err(err) => {
                    // Already audited by the lifecycle manager; keep trying
                    // the remaining candidates
                    tracing::warn!(pool = %decision.pool_name, "entry failed: {}", err);
                }
            }
        }
    }

    /// Fill in holder and organic data the feed does not carry
    async fn enrich(&self, mut snapshot: PoolSnapshot) -> PoolSnapshot {
        if snapshot.holder_count.is_some() && snapshot.organic_score.is_some() {
            return snapshot;
        }
        match self.enrichment.by_address(&snapshot.mint_x).await {
            Ok(Some(info)) => {
                if snapshot.holder_count.is_none() {
                    snapshot.holder_count = info.holder_count;
                }
                if snapshot.organic_score.is_none() {
                    snapshot.organic_score = info.organic_score;
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::debug!(pool = %snapshot.name, "enrichment unavailable: {}", err);
            }
        }
        snapshot
    }

    async fn log_decision(&self, decision: &StrategyDecision) {
        let entry = DecisionLogEntry {
            timestamp: Utc::now(),
            pool_address: decision.pool_address.clone(),
            pool_name: decision.pool_name.clone(),
            action: match decision.action {
                Action::Enter => DecisionAction::Enter,
                Action::Skip => DecisionAction::Skip,
            },
            strategy: decision.preset.name.to_string(),
            rationale: decision.rationale.clone(),
            confidence: decision.confidence.to_string(),
            condition: decision.condition.label(),
        };
        if let Err(err) = self.store.log_decision(&entry).await {
            tracing::warn!("failed to record decision: {}", err);
        }
    }

    /// Close every active position now, bypassing thresholds
    pub async fn emergency_exit_all(&self, reason: &str) -> Vec<MonitorAction> {
        self.monitor.emergency_exit_all(reason).await
    }

    /// One monitoring sweep, escalating to full liquidation on a daily
    /// loss breach
    pub async fn monitor_tick(&self) {
        let actions = self.monitor.tick().await;
        let breached = actions
            .iter()
            .any(|a| matches!(a, MonitorAction::DailyLossBreach { .. }));

        if breached && self.config.halt_on_daily_loss {
            self.monitor.emergency_exit_all("daily_loss_limit").await;
            self.stop().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    use crate::domain::position::RiskDefaults;
    use crate::ports::market_data::{FeedError, PoolEnrichment};
    use crate::ports::mocks::{
        MemoryStore, MockChain, MockExchange, MockFeed, MockNotifier, MockOracle,
    };
    use crate::application::lifecycle::{LifecycleConfig, PositionManager};

    use async_trait::async_trait;

    struct NoEnrichment;

    #[async_trait]
    impl EnrichmentSource for NoEnrichment {
        async fn by_address(&self, _mint: &str) -> Result<Option<PoolEnrichment>, FeedError> {
            Ok(None)
        }

        async fn search(&self, _query: &str) -> Result<Vec<PoolEnrichment>, FeedError> {
            Ok(Vec::new())
        }
    }

    struct FixedEnrichment {
        holders: u64,
    }

    #[async_trait]
    impl EnrichmentSource for FixedEnrichment {
        async fn by_address(&self, mint: &str) -> Result<Option<PoolEnrichment>, FeedError> {
            Ok(Some(PoolEnrichment {
                address: mint.to_string(),
                name: String::new(),
                holder_count: Some(self.holders),
                organic_score: Some(0.9),
            }))
        }

        async fn search(&self, _query: &str) -> Result<Vec<PoolEnrichment>, FeedError> {
            Ok(Vec::new())
        }
    }

    fn snapshot(address: &str, fees_24h: f64) -> PoolSnapshot {
        PoolSnapshot {
            address: address.to_string(),
            name: "DOG-SOL".to_string(),
            mint_x: "dogmint".to_string(),
            mint_y: "So11111111111111111111111111111111111111112".to_string(),
            bin_step: 20,
            price: 0.001,
            liquidity_usd: 100_000.0,
            volume_1h: 150_000.0,
            volume_rate_30m: 150_000.0,
            volume_rate_1h: 150_000.0,
            volume_rate_4h: 100_000.0,
            price_change_1h_pct: 1.0,
            price_change_4h_pct: 2.0,
            fees_24h,
            created_at: Some(Utc::now() - ChronoDuration::days(5)),
            holder_count: Some(1_000),
            organic_score: Some(0.8),
        }
    }

    struct Harness {
        feed: Arc<MockFeed>,
        store: Arc<MemoryStore>,
        orchestrator: Orchestrator,
    }

    fn harness(
        snapshots: Vec<PoolSnapshot>,
        enrichment: Arc<dyn EnrichmentSource>,
        config: OrchestratorConfig,
    ) -> Harness {
        let feed = Arc::new(MockFeed::new().with_snapshots(snapshots));
        let store = Arc::new(MemoryStore::new());
        let notifier = Arc::new(MockNotifier::new());
        let manager = Arc::new(PositionManager::new(
            Arc::new(MockOracle::new()),
            Arc::new(MockExchange::new()),
            Arc::new(MockChain::new()),
            store.clone(),
            notifier.clone(),
            LifecycleConfig {
                simulate: true,
                defaults: RiskDefaults::default(),
                ..LifecycleConfig::default()
            },
        ));
        let monitor = ExitMonitor::new(manager.clone(), store.clone(), notifier, 10.0);
        let orchestrator = Orchestrator::new(
            feed.clone(),
            enrichment,
            manager,
            monitor,
            store.clone(),
            config,
        );
        Harness {
            feed,
            store,
            orchestrator,
        }
    }

    #[tokio::test]
    async fn test_discovery_opens_best_entries_up_to_cap() {
        let mut config = OrchestratorConfig::default();
        config.max_open_positions = 2;
        let h = harness(
            vec![
                snapshot("pool-a", 500.0),
                snapshot("pool-b", 2_000.0),
                snapshot("pool-c", 1_000.0),
            ],
            Arc::new(NoEnrichment),
            config,
        );

        h.orchestrator.discovery_tick().await;

        let active = h.store.active_positions().await.unwrap();
        assert_eq!(active.len(), 2);
        // Highest fee yield first
        let pools: Vec<&str> = active.iter().map(|p| p.pool_address.as_str()).collect();
        assert!(pools.contains(&"pool-b"));
        assert!(pools.contains(&"pool-c"));

        // Every scanned pool was audited
        assert_eq!(h.store.decisions().len(), 3);
    }

    #[tokio::test]
    async fn test_discovery_skips_pools_already_held() {
        let config = OrchestratorConfig {
            max_open_positions: 5,
            ..OrchestratorConfig::default()
        };
        let h = harness(
            vec![snapshot("pool-a", 500.0)],
            Arc::new(NoEnrichment),
            config,
        );

        h.orchestrator.discovery_tick().await;
        h.orchestrator.discovery_tick().await;

        // Second pass found the pool already held
        assert_eq!(h.store.active_positions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_discovery_survives_feed_failure() {
        let h = harness(
            vec![snapshot("pool-a", 500.0)],
            Arc::new(NoEnrichment),
            OrchestratorConfig::default(),
        );
        h.feed.set_fail(true);
        h.orchestrator.discovery_tick().await;
        assert!(h.store.active_positions().await.unwrap().is_empty());
        assert!(h.store.decisions().is_empty());
    }

    #[tokio::test]
    async fn test_enrichment_fills_missing_holder_data() {
        let mut s = snapshot("pool-a", 500.0);
        s.holder_count = None;
        s.organic_score = None;
        let h = harness(
            vec![s],
            Arc::new(FixedEnrichment { holders: 200 }),
            OrchestratorConfig::default(),
        );

        h.orchestrator.discovery_tick().await;

        // 200 holders on a 5-day-old token classifies as a memecoin
        let decisions = h.store.decisions();
        assert_eq!(decisions.len(), 1);
        assert!(decisions[0].condition.starts_with("memecoin/"));
    }

    #[tokio::test]
    async fn test_monitor_tick_halts_and_liquidates_on_breach() {
        let config = OrchestratorConfig {
            halt_on_daily_loss: true,
            ..OrchestratorConfig::default()
        };
        let h = harness(
            vec![snapshot("pool-a", 500.0)],
            Arc::new(NoEnrichment),
            config,
        );

        h.orchestrator.discovery_tick().await;
        assert_eq!(h.store.active_positions().await.unwrap().len(), 1);

        // Inject a realized loss big enough to trip the 10% governor
        let mut loser = h.store.active_positions().await.unwrap()[0].clone();
        let loser_id = loser.id.clone();
        loser.close(Utc::now(), 0.0, "stop_loss", -1.0).unwrap();
        h.store.update_position(&loser).await.unwrap();
        h.orchestrator.discovery_tick().await;
        assert_eq!(h.store.active_positions().await.unwrap().len(), 1);

        *h.orchestrator.running.write().await = true;
        h.orchestrator.monitor_tick().await;

        // Everything was liquidated and the engine halted
        assert!(h.store.active_positions().await.unwrap().is_empty());
        assert!(!h.orchestrator.is_running().await);

        // The already-closed loser kept its original exit record
        let loser = h.store.position(&loser_id).await.unwrap().unwrap();
        assert_eq!(loser.exit_reason.as_deref(), Some("stop_loss"));
    }

    #[tokio::test]
    async fn test_run_stops_on_request() {
        let h = harness(
            vec![],
            Arc::new(NoEnrichment),
            OrchestratorConfig {
                discovery_interval_secs: 3600,
                monitor_interval_secs: 3600,
                ..OrchestratorConfig::default()
            },
        );
        let orchestrator = Arc::new(h.orchestrator);
        let runner = {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move { orchestrator.run().await })
        };
        // Let the loop start, then stop it
        tokio::time::sleep(Duration::from_millis(50)).await;
        orchestrator.stop().await;
        tokio::time::timeout(Duration::from_secs(5), runner)
            .await
            .expect("engine did not stop")
            .unwrap();
    }
}
