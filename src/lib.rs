//! Quest and quest-line progression engine.
//!
//! `QuestEngine` tracks which quests can start, advances objectives, grants
//! rewards through a `RewardSink` and forwards completions to the
//! `QuestLineEngine`, which unlocks narrative nodes. Both engines are plain
//! single-threaded state containers; notifications are queued and drained
//! by the caller.

pub mod config;
pub mod quest;
pub mod quest_line;
pub mod save;

pub use config::Config;
pub use quest::{
    GameEvent, LoggingRewardSink, Progress, QuestDefinition, QuestEngine, QuestNotification,
    QuestStatus, RewardSink,
};
pub use quest_line::{NodeState, QuestLineDefinition, QuestLineEngine, QuestLineNode};
pub use save::{JsonFileStore, QuestSnapshot, SnapshotStore};
