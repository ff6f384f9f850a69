//! Quest Event Types
//!
//! Inbound game events that drive objective progress, and the outbound
//! notifications both engines queue for UI and other listeners.

use serde::{Deserialize, Serialize};

use super::definition::Vec3;
use super::state::QuestStatus;

/// Events that can trigger quest progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Player killed an enemy
    EnemyKilled {
        /// Enemy type id (e.g., "rat", "bandit_chief")
        enemy_id: String,
    },

    /// Player collected an item
    ItemCollected {
        item_id: String,
        /// Quantity collected
        count: i32,
    },

    /// Player talked to an NPC
    NpcTalkedTo { npc_id: String },

    /// Player moved to a position
    LocationReached { position: Vec3 },
}

impl GameEvent {
    /// Get event type as string (for logging/debugging)
    pub fn event_type(&self) -> &'static str {
        match self {
            GameEvent::EnemyKilled { .. } => "enemy_killed",
            GameEvent::ItemCollected { .. } => "item_collected",
            GameEvent::NpcTalkedTo { .. } => "npc_talked_to",
            GameEvent::LocationReached { .. } => "location_reached",
        }
    }
}

/// Notifications queued by the engines, in emission order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QuestNotification {
    QuestStatusChanged {
        quest_id: String,
        status: QuestStatus,
    },
    QuestCompleted {
        quest_id: String,
    },
    QuestFailed {
        quest_id: String,
    },
    /// Achievement listed on a completed quest
    AchievementTriggered {
        quest_id: String,
        achievement_id: String,
    },
    /// Scene trigger whose condition was met
    SceneTriggered {
        quest_id: String,
        scene_id: String,
        animation: Option<String>,
        skippable: bool,
    },
    QuestLineProgressed {
        line_id: String,
        node_id: String,
    },
    QuestLineCompleted {
        line_id: String,
    },
}

impl QuestNotification {
    /// Quest id this notification concerns, if any
    pub fn quest_id(&self) -> Option<&str> {
        match self {
            QuestNotification::QuestStatusChanged { quest_id, .. }
            | QuestNotification::QuestCompleted { quest_id }
            | QuestNotification::QuestFailed { quest_id }
            | QuestNotification::AchievementTriggered { quest_id, .. }
            | QuestNotification::SceneTriggered { quest_id, .. } => Some(quest_id),
            QuestNotification::QuestLineProgressed { .. }
            | QuestNotification::QuestLineCompleted { .. } => None,
        }
    }
}
