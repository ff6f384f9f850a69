//! Quest State Tracking
//!
//! Runtime status and objective progress for each quest.

use std::collections::HashMap;
use serde::{Deserialize, Serialize};

/// Status of a quest for the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum QuestStatus {
    /// Never started (never stored)
    #[default]
    None,
    /// Startable right now (computed, never stored)
    Available,
    /// Quest is active and in progress
    InProgress,
    /// Quest has been completed
    Completed,
    /// Quest was failed
    Failed,
}

impl QuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::None => "none",
            QuestStatus::Available => "available",
            QuestStatus::InProgress => "in_progress",
            QuestStatus::Completed => "completed",
            QuestStatus::Failed => "failed",
        }
    }

    /// Integer code used in save snapshots
    pub fn as_i32(&self) -> i32 {
        match self {
            QuestStatus::None => 0,
            QuestStatus::Available => 1,
            QuestStatus::InProgress => 2,
            QuestStatus::Completed => 3,
            QuestStatus::Failed => 4,
        }
    }

    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(QuestStatus::None),
            1 => Some(QuestStatus::Available),
            2 => Some(QuestStatus::InProgress),
            3 => Some(QuestStatus::Completed),
            4 => Some(QuestStatus::Failed),
            _ => None,
        }
    }

    /// Check if the quest can no longer change status
    pub fn is_terminal(&self) -> bool {
        matches!(self, QuestStatus::Completed | QuestStatus::Failed)
    }
}

/// Progress value recorded against a single objective.
///
/// Counters back kill/collect objectives, flags back talk/location ones.
/// Serializes as a bare integer or boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Progress {
    Count(i32),
    Flag(bool),
}

impl Progress {
    pub fn as_count(&self) -> Option<i32> {
        match self {
            Progress::Count(n) => Some(*n),
            Progress::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Progress::Flag(b) => Some(*b),
            Progress::Count(_) => None,
        }
    }
}

impl From<i32> for Progress {
    fn from(n: i32) -> Self {
        Progress::Count(n)
    }
}

impl From<bool> for Progress {
    fn from(b: bool) -> Self {
        Progress::Flag(b)
    }
}

/// Mutable state of one quest, created lazily on first mutation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestRuntimeState {
    pub status: QuestStatus,
    /// Progress per objective (keyed by objective_id)
    pub progress: HashMap<String, Progress>,
}

impl QuestRuntimeState {
    /// Fresh state for a quest that was just started
    pub fn started() -> Self {
        Self {
            status: QuestStatus::InProgress,
            progress: HashMap::new(),
        }
    }

    pub fn get_progress(&self, objective_id: &str) -> Option<&Progress> {
        self.progress.get(objective_id)
    }

    /// Record progress, returning the previous value
    pub fn set_progress(&mut self, objective_id: &str, value: Progress) -> Option<Progress> {
        self.progress.insert(objective_id.to_string(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        for status in [
            QuestStatus::None,
            QuestStatus::Available,
            QuestStatus::InProgress,
            QuestStatus::Completed,
            QuestStatus::Failed,
        ] {
            assert_eq!(QuestStatus::from_i32(status.as_i32()), Some(status));
        }
        assert_eq!(QuestStatus::from_i32(9), None);
        assert_eq!(QuestStatus::InProgress.as_i32(), 2);
    }

    #[test]
    fn test_progress_serializes_as_scalar() {
        assert_eq!(serde_json::to_string(&Progress::Count(3)).unwrap(), "3");
        assert_eq!(serde_json::to_string(&Progress::Flag(true)).unwrap(), "true");

        let parsed: Progress = serde_json::from_str("false").unwrap();
        assert_eq!(parsed, Progress::Flag(false));
        let parsed: Progress = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, Progress::Count(7));
        assert_eq!(parsed.as_count(), Some(7));
        assert_eq!(parsed.as_flag(), None);
        assert_eq!(Progress::Flag(true).as_flag(), Some(true));
    }

    #[test]
    fn test_runtime_state() {
        let mut state = QuestRuntimeState::started();
        assert_eq!(state.status, QuestStatus::InProgress);
        assert!(state.progress.is_empty());

        assert_eq!(state.set_progress("obj1", 2.into()), None);
        assert_eq!(state.set_progress("obj1", 3.into()), Some(Progress::Count(2)));
        assert_eq!(state.get_progress("obj1"), Some(&Progress::Count(3)));
        assert!(!state.status.is_terminal());
    }
}
