//! JSON file record store
//!
//! Single-file persistence for positions, rebalance history, and the
//! decision audit log. State loads once at startup and every mutation
//! rewrites the whole file; volumes here are tens of positions, not
//! thousands, so pretty JSON beats a database for inspectability.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::domain::position::{DecisionLogEntry, Position, PositionStatus, RebalanceRecord};
use crate::ports::store::{RecordStore, StoreError};

use async_trait::async_trait;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    positions: HashMap<String, Position>,
    rebalances: Vec<RebalanceRecord>,
    decisions: Vec<DecisionLogEntry>,
}

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl JsonFileStore {
    /// Open the store, creating parent directories and starting empty when
    /// the file does not exist yet
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }

        let state = match tokio::fs::read_to_string(&path).await {
            Ok(content) => serde_json::from_str(&content)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => StoreState::default(),
            Err(err) => return Err(StoreError::Io(err.to_string())),
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    async fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn insert_position(&self, position: &Position) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .positions
            .insert(position.id.clone(), position.clone());
        self.persist(&state).await
    }

    async fn update_position(&self, position: &Position) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.positions.contains_key(&position.id) {
            return Err(StoreError::NotFound(position.id.clone()));
        }
        state
            .positions
            .insert(position.id.clone(), position.clone());
        self.persist(&state).await
    }

    async fn position(&self, id: &str) -> Result<Option<Position>, StoreError> {
        Ok(self.state.lock().await.positions.get(id).cloned())
    }

    async fn active_positions(&self) -> Result<Vec<Position>, StoreError> {
        let state = self.state.lock().await;
        let mut active: Vec<Position> = state
            .positions
            .values()
            .filter(|p| p.status == PositionStatus::Active)
            .cloned()
            .collect();
        active.sort_by(|a, b| a.entry_time.cmp(&b.entry_time));
        Ok(active)
    }

    async fn insert_rebalance(&self, record: &RebalanceRecord) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.rebalances.push(record.clone());
        self.persist(&state).await
    }

    async fn log_decision(&self, entry: &DecisionLogEntry) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.decisions.push(entry.clone());
        self.persist(&state).await
    }

    async fn today_realized_pnl(&self) -> Result<f64, StoreError> {
        let today = Utc::now().date_naive();
        let state = self.state.lock().await;
        Ok(state
            .positions
            .values()
            .filter(|p| {
                p.status == PositionStatus::Closed
                    && p.exit_time.map_or(false, |t| t.date_naive() == today)
            })
            .filter_map(|p| p.realized_pnl)
            .sum())
    }

    async fn total_active_capital(&self) -> Result<f64, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .positions
            .values()
            .filter(|p| p.status == PositionStatus::Active)
            .map(|p| p.entry_amount)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn position(id: &str) -> Position {
        Position::new(
            id.to_string(),
            "pool111".to_string(),
            "WIF-SOL".to_string(),
            "wif".to_string(),
            "sol".to_string(),
            "MEME_SCALPER".to_string(),
            Utc::now(),
            1.0,
            0.0012,
            -8,
            8,
            true,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_open_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/state.json");
        let store = JsonFileStore::open(&path).await.unwrap();
        store.insert_position(&position("p1")).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        {
            let store = JsonFileStore::open(&path).await.unwrap();
            let mut p = position("p1");
            store.insert_position(&p).await.unwrap();
            p.close(Utc::now(), 1.2, "take_profit", 0.2).unwrap();
            store.update_position(&p).await.unwrap();
            store.insert_position(&position("p2")).await.unwrap();
        }

        let store = JsonFileStore::open(&path).await.unwrap();
        let p1 = store.position("p1").await.unwrap().unwrap();
        assert_eq!(p1.status, PositionStatus::Closed);
        assert_eq!(p1.exit_reason.as_deref(), Some("take_profit"));
        assert_eq!(store.active_positions().await.unwrap().len(), 1);
        assert_eq!(store.today_realized_pnl().await.unwrap(), 0.2);
        assert_eq!(store.total_active_capital().await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn test_update_unknown_position_fails() {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::open(dir.path().join("state.json"))
            .await
            .unwrap();
        let result = store.update_position(&position("ghost")).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_corrupt_file_is_an_error_not_a_wipe() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();
        let result = JsonFileStore::open(&path).await;
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_rebalances_and_decisions_append() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let store = JsonFileStore::open(&path).await.unwrap();

        let record = RebalanceRecord {
            position_id: "p1".to_string(),
            timestamp: Utc::now(),
            old_lower_bin: -8,
            old_upper_bin: 8,
            new_lower_bin: -4,
            new_upper_bin: 12,
            old_active_bin: 0,
            new_active_bin: 4,
            fees_claimed: 0.01,
        };
        store.insert_rebalance(&record).await.unwrap();
        store.insert_rebalance(&record).await.unwrap();

        let reopened = JsonFileStore::open(&path).await.unwrap();
        assert_eq!(reopened.state.lock().await.rebalances.len(), 2);
    }
}
