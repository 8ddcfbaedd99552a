//! Exit & Risk Monitor
//!
//! Periodically sweeps active positions against their exit thresholds and
//! enforces the daily loss governor. One position failing never blocks the
//! rest of the sweep, and a breach of the daily loss limit is reported to
//! the caller, which decides whether to liquidate everything.

use std::sync::Arc;

use chrono::Utc;

use crate::domain::risk::{check_daily_loss, evaluate_exit};
use crate::ports::notifier::Notifier;
use crate::ports::store::RecordStore;

use super::lifecycle::PositionManager;

/// Something the monitor did or observed during a sweep
#[derive(Debug, Clone)]
pub enum MonitorAction {
    Closed {
        id: String,
        reason: &'static str,
        pnl: f64,
    },
    CloseFailed {
        id: String,
        error: String,
    },
    DailyLossBreach {
        ratio_pct: f64,
    },
}

pub struct ExitMonitor {
    manager: Arc<PositionManager>,
    store: Arc<dyn RecordStore>,
    notifier: Arc<dyn Notifier>,
    max_daily_loss_pct: f64,
}

impl ExitMonitor {
    pub fn new(
        manager: Arc<PositionManager>,
        store: Arc<dyn RecordStore>,
        notifier: Arc<dyn Notifier>,
        max_daily_loss_pct: f64,
    ) -> Self {
        Self {
            manager,
            store,
            notifier,
            max_daily_loss_pct,
        }
    }

    /// One monitoring sweep: evaluate every active position in order, close
    /// the ones that hit a threshold, then check the daily loss governor
    /// against the day's realized pnl.
    pub async fn tick(&self) -> Vec<MonitorAction> {
        let mut actions = Vec::new();

        let positions = match self.store.active_positions().await {
            Ok(positions) => positions,
            Err(err) => {
                tracing::warn!("monitor sweep skipped, store unavailable: {}", err);
                return actions;
            }
        };

        let now = Utc::now();
        for position in &positions {
            let live_value = self.manager.valuate(position).await;
            let Some(signal) = evaluate_exit(position, live_value, self.manager.defaults(), now)
            else {
                continue;
            };

            tracing::info!(
                id = %position.id,
                pool = %position.pool_name,
                signal = ?signal,
                "exit threshold hit"
            );
            match self.manager.close(&position.id, signal.reason()).await {
                Ok(closed) => actions.push(MonitorAction::Closed {
                    id: closed.id.clone(),
                    reason: signal.reason(),
                    pnl: closed.realized_pnl.unwrap_or(0.0),
                }),
                Err(err) => {
                    tracing::warn!(id = %position.id, "close failed, will retry: {}", err);
                    actions.push(MonitorAction::CloseFailed {
                        id: position.id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }

        if let Some(breach) = self.daily_loss_breach().await {
            actions.push(breach);
        }
        actions
    }

    async fn daily_loss_breach(&self) -> Option<MonitorAction> {
        let pnl = match self.store.today_realized_pnl().await {
            Ok(pnl) => pnl,
            Err(err) => {
                tracing::warn!("daily loss check skipped: {}", err);
                return None;
            }
        };
        let capital = match self.store.total_active_capital().await {
            Ok(capital) => capital,
            Err(err) => {
                tracing::warn!("daily loss check skipped: {}", err);
                return None;
            }
        };

        let check = check_daily_loss(pnl, capital, self.max_daily_loss_pct);
        if check.breached {
            tracing::error!(
                pnl,
                capital,
                ratio_pct = check.ratio_pct,
                limit_pct = self.max_daily_loss_pct,
                "daily loss limit breached"
            );
            Some(MonitorAction::DailyLossBreach {
                ratio_pct: check.ratio_pct,
            })
        } else {
            None
        }
    }

    /// Close every active position regardless of thresholds. Notifies once
    /// up front and keeps going past individual failures.
    pub async fn emergency_exit_all(&self, reason: &str) -> Vec<MonitorAction> {
        let positions = match self.store.active_positions().await {
            Ok(positions) => positions,
            Err(err) => {
                tracing::error!("emergency exit aborted, store unavailable: {}", err);
                return Vec::new();
            }
        };
        if positions.is_empty() {
            return Vec::new();
        }

        tracing::error!(count = positions.len(), reason, "emergency exit of all positions");
        self.notifier.emergency_exit(positions.len(), reason).await;

        let exit_reason = format!("emergency:{}", reason);
        let mut actions = Vec::new();
        for position in &positions {
            match self.manager.close(&position.id, &exit_reason).await {
                Ok(closed) => actions.push(MonitorAction::Closed {
                    id: closed.id.clone(),
                    reason: "emergency",
                    pnl: closed.realized_pnl.unwrap_or(0.0),
                }),
                Err(err) => {
                    tracing::error!(id = %position.id, "emergency close failed: {}", err);
                    actions.push(MonitorAction::CloseFailed {
                        id: position.id.clone(),
                        error: err.to_string(),
                    });
                }
            }
        }
        actions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use async_trait::async_trait;
    use mockall::mock;

    use crate::domain::condition::{
        MarketCondition, PriceTrend, TokenCategory, Volatility, VolumeLevel, VolumeTrend,
    };
    use crate::domain::position::{
        DecisionLogEntry, Position, RebalanceRecord, RiskDefaults,
    };
    use crate::ports::mocks::{MemoryStore, MockChain, MockExchange, MockNotifier, MockOracle};
    use crate::ports::store::{RecordStore, StoreError};
    use crate::strategy::presets::{ALT_BALANCED, MEME_SCALPER};
    use crate::strategy::selector::{Action, Confidence, EntryRange, StrategyDecision};

    use crate::application::lifecycle::{LifecycleConfig, PositionManager};

    mock! {
        Store {}

        #[async_trait]
        impl RecordStore for Store {
            async fn insert_position(&self, position: &Position) -> Result<(), StoreError>;
            async fn update_position(&self, position: &Position) -> Result<(), StoreError>;
            async fn position(&self, id: &str) -> Result<Option<Position>, StoreError>;
            async fn active_positions(&self) -> Result<Vec<Position>, StoreError>;
            async fn insert_rebalance(&self, record: &RebalanceRecord) -> Result<(), StoreError>;
            async fn log_decision(&self, entry: &DecisionLogEntry) -> Result<(), StoreError>;
            async fn today_realized_pnl(&self) -> Result<f64, StoreError>;
            async fn total_active_capital(&self) -> Result<f64, StoreError>;
        }
    }

    fn decision(preset: crate::strategy::presets::StrategyPreset) -> StrategyDecision {
        StrategyDecision {
            pool_address: "pool111".to_string(),
            pool_name: "WIF-SOL".to_string(),
            action: Action::Enter,
            preset,
            condition: MarketCondition {
                volatility: Volatility::High,
                volume: VolumeLevel::High,
                token_category: TokenCategory::Memecoin,
                price_trend: PriceTrend::Sideways,
                volume_trend: VolumeTrend::Stable,
            },
            range: EntryRange { lower: -8, upper: 8 },
            rationale: "test".to_string(),
            confidence: Confidence::High,
            fee_tvl_ratio: 0.01,
        }
    }

    struct Harness {
        store: Arc<MemoryStore>,
        notifier: Arc<MockNotifier>,
        manager: Arc<PositionManager>,
        monitor: ExitMonitor,
    }

    fn harness(max_daily_loss_pct: f64) -> Harness {
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
        let monitor = ExitMonitor::new(
            manager.clone(),
            store.clone(),
            notifier.clone(),
            max_daily_loss_pct,
        );
        Harness {
            store,
            notifier,
            manager,
            monitor,
        }
    }

    async fn open_aged(h: &Harness, preset: crate::strategy::presets::StrategyPreset, age_hours: f64) -> String {
        let id = h
            .manager
            .open(&decision(preset), 1_000_000_000)
            .await
            .unwrap();
        let mut position = h.store.position(&id).await.unwrap().unwrap();
        position.entry_time = Utc::now() - chrono::Duration::minutes((age_hours * 60.0) as i64);
        h.store.update_position(&position).await.unwrap();
        id
    }

    #[tokio::test]
    async fn test_tick_with_no_positions_does_nothing() {
        let h = harness(10.0);
        assert!(h.monitor.tick().await.is_empty());
        assert!(h.notifier.emergencies().is_empty());
    }

    #[tokio::test]
    async fn test_tick_leaves_fresh_positions_open() {
        let h = harness(10.0);
        // Simulated value stays at entry, so TP and SL never trip
        open_aged(&h, MEME_SCALPER, 1.0).await;
        assert!(h.monitor.tick().await.is_empty());
    }

    #[tokio::test]
    async fn test_tick_closes_on_max_hold_time() {
        let h = harness(10.0);
        // MEME_SCALPER holds at most 12 hours
        let id = open_aged(&h, MEME_SCALPER, 13.0).await;

        let actions = h.monitor.tick().await;
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            MonitorAction::Closed { id: closed_id, reason, .. } => {
                assert_eq!(closed_id, &id);
                assert_eq!(*reason, "max_hold_time");
            }
            other => panic!("unexpected action: {:?}", other),
        }

        let stored = h.store.position(&id).await.unwrap().unwrap();
        assert!(!stored.is_active());
        assert_eq!(stored.exit_reason.as_deref(), Some("max_hold_time"));
    }

    #[tokio::test]
    async fn test_tick_applies_account_defaults_when_preset_has_none() {
        let h = harness(10.0);
        // ALT_BALANCED caps holds at 48 hours of its own; age past the
        // account default instead by clearing the override
        let id = open_aged(&h, ALT_BALANCED, 80.0).await;
        let mut position = h.store.position(&id).await.unwrap().unwrap();
        position.max_hold_hours = None;
        h.store.update_position(&position).await.unwrap();

        // Account default is 72 hours
        let actions = h.monitor.tick().await;
        assert_eq!(actions.len(), 1);
        assert!(matches!(actions[0], MonitorAction::Closed { .. }));
    }

    #[tokio::test]
    async fn test_daily_loss_breach_reported() {
        let h = harness(10.0);
        // One big realized loss today, one active position carrying capital
        let loser = open_aged(&h, MEME_SCALPER, 1.0).await;
        let mut position = h.store.position(&loser).await.unwrap().unwrap();
        position
            .close(Utc::now(), 0.5, "stop_loss", -0.5)
            .unwrap();
        h.store.update_position(&position).await.unwrap();
        open_aged(&h, MEME_SCALPER, 1.0).await;

        // Loss of 0.5 against 1.0 active capital is 50%, limit is 10%
        let actions = h.monitor.tick().await;
        assert_eq!(actions.len(), 1);
        match &actions[0] {
            MonitorAction::DailyLossBreach { ratio_pct } => {
                assert_relative_eq!(*ratio_pct, 50.0, epsilon = 1e-9);
            }
            other => panic!("unexpected action: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_breach_on_profitable_day() {
        let h = harness(10.0);
        let winner = open_aged(&h, MEME_SCALPER, 1.0).await;
        let mut position = h.store.position(&winner).await.unwrap().unwrap();
        position
            .close(Utc::now(), 1.4, "take_profit", 0.4)
            .unwrap();
        h.store.update_position(&position).await.unwrap();
        open_aged(&h, MEME_SCALPER, 1.0).await;

        assert!(h.monitor.tick().await.is_empty());
    }

    #[tokio::test]
    async fn test_emergency_exit_closes_everything_and_notifies_once() {
        let h = harness(10.0);
        let a = open_aged(&h, MEME_SCALPER, 1.0).await;
        let b = open_aged(&h, ALT_BALANCED, 1.0).await;

        let actions = h.monitor.emergency_exit_all("daily_loss_limit").await;
        assert_eq!(actions.len(), 2);
        assert!(actions
            .iter()
            .all(|a| matches!(a, MonitorAction::Closed { .. })));

        for id in [&a, &b] {
            let stored = h.store.position(id).await.unwrap().unwrap();
            assert!(!stored.is_active());
            assert_eq!(
                stored.exit_reason.as_deref(),
                Some("emergency:daily_loss_limit")
            );
        }

        let emergencies = h.notifier.emergencies();
        assert_eq!(emergencies, vec![(2, "daily_loss_limit".to_string())]);
    }

    #[tokio::test]
    async fn test_emergency_exit_with_no_positions_skips_notification() {
        let h = harness(10.0);
        assert!(h.monitor.emergency_exit_all("manual").await.is_empty());
        assert!(h.notifier.emergencies().is_empty());
    }

    #[tokio::test]
    async fn test_tick_survives_store_aggregate_failures() {
        let mut store = MockStore::new();
        store
            .expect_active_positions()
            .returning(|| Ok(Vec::new()));
        store
            .expect_today_realized_pnl()
            .returning(|| Err(StoreError::Io("disk gone".to_string())));
        let store: Arc<dyn RecordStore> = Arc::new(store);

        let notifier = Arc::new(MockNotifier::new());
        let manager = Arc::new(PositionManager::new(
            Arc::new(MockOracle::new()),
            Arc::new(MockExchange::new()),
            Arc::new(MockChain::new()),
            store.clone(),
            notifier.clone(),
            LifecycleConfig::default(),
        ));
        let monitor = ExitMonitor::new(manager, store, notifier, 10.0);

        // The sweep completes and simply skips the governor check
        assert!(monitor.tick().await.is_empty());
    }
}
