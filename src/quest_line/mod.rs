//! Quest Line Module
//!
//! Directed graphs of narrative nodes that unlock as quests complete.

pub mod definition;
pub mod engine;

pub use definition::{NodeState, QuestLineDefinition, QuestLineNode, RawQuestLineFile};
pub use engine::QuestLineEngine;
