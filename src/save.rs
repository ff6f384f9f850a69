//! Save Snapshots
//!
//! Flat snapshot of quest and quest line state exchanged with the save layer,
//! plus a JSON file store.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::quest::Progress;

/// Errors from a snapshot store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access save file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid save data: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything needed to restore both engines.
///
/// Statuses and node states are stored as integer codes
/// (`QuestStatus::as_i32`, `NodeState::as_i32`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestSnapshot {
    #[serde(default)]
    pub quest_statuses: HashMap<String, i32>,
    #[serde(default)]
    pub quest_progress: HashMap<String, HashMap<String, Progress>>,
    #[serde(default)]
    pub quest_line_node_states: HashMap<String, i32>,
}

impl QuestSnapshot {
    pub fn to_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Save-layer collaborator the engine persists through
pub trait SnapshotStore {
    fn save(&mut self, snapshot: &QuestSnapshot) -> Result<(), StoreError>;
    /// Returns `None` when nothing has been saved yet
    fn load(&mut self) -> Result<Option<QuestSnapshot>, StoreError>;
}

/// Stores the snapshot as a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&mut self, snapshot: &QuestSnapshot) -> Result<(), StoreError> {
        let json = snapshot.to_json()?;
        std::fs::write(&self.path, json).map_err(|e| self.io_error(e))?;
        debug!("Saved quest snapshot to {:?}", self.path);
        Ok(())
    }

    fn load(&mut self) -> Result<Option<QuestSnapshot>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let json = std::fs::read_to_string(&self.path).map_err(|e| self.io_error(e))?;
        let snapshot = QuestSnapshot::from_json(&json)?;
        info!(
            "Loaded quest snapshot from {:?} ({} quests, {} nodes)",
            self.path,
            snapshot.quest_statuses.len(),
            snapshot.quest_line_node_states.len()
        );
        Ok(Some(snapshot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_json_shape() {
        let mut snapshot = QuestSnapshot::default();
        snapshot.quest_statuses.insert("q1".to_string(), 2);
        snapshot
            .quest_progress
            .entry("q1".to_string())
            .or_default()
            .insert("obj1".to_string(), Progress::Count(2));
        snapshot.quest_line_node_states.insert("n1".to_string(), 1);

        let value: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(value["questStatuses"]["q1"], 2);
        assert_eq!(value["questProgress"]["q1"]["obj1"], 2);
        assert_eq!(value["questLineNodeStates"]["n1"], 1);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let snapshot = QuestSnapshot::from_json(r#"{"questStatuses": {"q1": 3}}"#).unwrap();
        assert_eq!(snapshot.quest_statuses["q1"], 3);
        assert!(snapshot.quest_progress.is_empty());
        assert!(snapshot.quest_line_node_states.is_empty());
    }

    #[test]
    fn test_file_store() {
        let temp_dir = TempDir::new().unwrap();
        let mut store = JsonFileStore::new(temp_dir.path().join("quests.json"));
        assert!(store.load().unwrap().is_none());

        let mut snapshot = QuestSnapshot::default();
        snapshot.quest_statuses.insert("q1".to_string(), 3);
        store.save(&snapshot).unwrap();

        assert_eq!(store.load().unwrap(), Some(snapshot));
    }

    #[test]
    fn test_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("quests.json");
        std::fs::write(&path, "not json").unwrap();

        let mut store = JsonFileStore::new(&path);
        assert!(matches!(store.load(), Err(StoreError::Json(_))));
    }
}
