//! Quest System Module
//!
//! Quest definitions, runtime state and the engine that advances them.
//! Objectives and rewards are closed enums; game events route into
//! objective progress and completions cascade into quest lines.

pub mod definition;
pub mod engine;
pub mod events;
pub mod registry;
pub mod reward;
pub mod state;

pub use definition::{
    DefinitionError, Dependency, DependencyCondition, DependencyOperator, NpcAssociation,
    NpcTalkType, Objective, ObjectiveKind, QuestDefinition, QuestKind, Reward, SceneTrigger,
    TriggerType, Vec3,
};
pub use engine::QuestEngine;
pub use events::{GameEvent, QuestNotification};
pub use registry::{DefinitionSource, StaticDefinitions, TomlDefinitions};
pub use reward::{GrantError, LoggingRewardSink, RewardSink};
pub use state::{Progress, QuestRuntimeState, QuestStatus};
