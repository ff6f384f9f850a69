//! Quest Definition Structures
//!
//! Raw structures are deserialized from TOML quest files and resolved into
//! the typed definitions the engine works with.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::state::Progress;

/// Errors raised while resolving raw definitions
#[derive(Debug, Error)]
pub enum DefinitionError {
    #[error("invalid objective type '{kind}' at index {index}")]
    UnknownObjective { kind: String, index: usize },
    #[error("objective '{0}' is missing its target")]
    MissingTarget(String),
    #[error("objective '{0}' is missing its position")]
    MissingPosition(String),
    #[error("invalid reward type '{kind}' at index {index}")]
    UnknownReward { kind: String, index: usize },
    #[error("reward at index {0} is missing its id")]
    MissingRewardId(usize),
    #[error("invalid dependency type '{kind}' at index {index}")]
    UnknownDependency { kind: String, index: usize },
    #[error("dependency at index {0} is missing its quest_id")]
    MissingDependencyQuest(usize),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// ============================================================================
// Raw TOML Structures
// ============================================================================

/// A quest file as it appears on disk
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestFile {
    pub quest: RawQuest,
}

/// Raw quest data as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuest {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub kind: QuestKind,
    pub quest_line_id: Option<String>,
    #[serde(default)]
    pub quest_line_order: i32,
    #[serde(default)]
    pub dependencies: Vec<RawDependency>,
    #[serde(default)]
    pub objectives: Vec<RawObjective>,
    #[serde(default)]
    pub rewards: Vec<RawReward>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub npc_associations: Vec<NpcAssociation>,
    #[serde(default)]
    pub scene_triggers: Vec<SceneTrigger>,
}

/// Raw dependency entry
#[derive(Debug, Clone, Deserialize)]
pub struct RawDependency {
    #[serde(rename = "type")]
    pub dependency_type: String,
    pub quest_id: Option<String>,
    #[serde(default)]
    pub level: i32,
    #[serde(default)]
    pub operator: DependencyOperator,
}

/// Raw objective as it appears in TOML
#[derive(Debug, Clone, Deserialize)]
pub struct RawObjective {
    pub id: String,
    #[serde(rename = "type")]
    pub objective_type: String,
    /// Enemy, item or NPC id depending on the type
    pub target: Option<String>,
    #[serde(default = "default_count")]
    pub count: i32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub consume_on_complete: bool,
    pub position: Option<Vec3>,
    #[serde(default = "default_radius")]
    pub radius: f32,
    #[serde(default)]
    pub spawn_locations: Vec<Vec3>,
}

/// Raw reward entry
#[derive(Debug, Clone, Deserialize)]
pub struct RawReward {
    #[serde(rename = "type")]
    pub reward_type: String,
    #[serde(default)]
    pub amount: i32,
    /// Item or equipment id
    pub id: Option<String>,
    #[serde(default = "default_count")]
    pub count: i32,
    pub currency: Option<String>,
}

fn default_count() -> i32 {
    1
}

fn default_radius() -> f32 {
    1.0
}

// ============================================================================
// Resolved Quest Structures
// ============================================================================

/// Main story quest or optional side quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestKind {
    #[default]
    Main,
    Side,
}

/// World position used by location objectives
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn distance(&self, other: &Vec3) -> f32 {
        let (dx, dy, dz) = (self.x - other.x, self.y - other.y, self.z - other.z);
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// How a dependency combines with its siblings.
///
/// Parsed and kept, but the engine always ANDs the dependency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyOperator {
    #[default]
    #[serde(alias = "AND")]
    And,
    #[serde(alias = "OR")]
    Or,
}

/// Condition a dependency checks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DependencyCondition {
    QuestCompleted(String),
    QuestInProgress(String),
    /// Player level is owned elsewhere; always passes
    LevelAtLeast(i32),
}

/// Precondition gating whether a quest can be started
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub condition: DependencyCondition,
    pub operator: DependencyOperator,
}

impl Dependency {
    pub fn new(condition: DependencyCondition) -> Self {
        Self {
            condition,
            operator: DependencyOperator::And,
        }
    }

    pub fn with_operator(mut self, operator: DependencyOperator) -> Self {
        self.operator = operator;
        self
    }

    pub fn from_raw(index: usize, raw: &RawDependency) -> Result<Self, DefinitionError> {
        let quest_id = || {
            raw.quest_id
                .clone()
                .ok_or(DefinitionError::MissingDependencyQuest(index))
        };
        let condition = match raw.dependency_type.to_lowercase().as_str() {
            "quest_completed" => DependencyCondition::QuestCompleted(quest_id()?),
            "quest_in_progress" => DependencyCondition::QuestInProgress(quest_id()?),
            "level" | "level_at_least" => DependencyCondition::LevelAtLeast(raw.level),
            _ => {
                return Err(DefinitionError::UnknownDependency {
                    kind: raw.dependency_type.clone(),
                    index,
                })
            }
        };
        Ok(Self {
            condition,
            operator: raw.operator,
        })
    }

    /// Quest referenced by this dependency, if any
    pub fn quest_id(&self) -> Option<&str> {
        match &self.condition {
            DependencyCondition::QuestCompleted(id) | DependencyCondition::QuestInProgress(id) => {
                Some(id)
            }
            DependencyCondition::LevelAtLeast(_) => None,
        }
    }
}

/// What an objective measures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectiveKind {
    /// Kill X enemies of type Y
    Kill {
        enemy_id: String,
        required_count: i32,
        spawn_locations: Vec<Vec3>,
    },
    /// Collect X items of type Y
    Collect {
        item_id: String,
        required_count: i32,
        consume_on_complete: bool,
    },
    /// Talk to a specific NPC
    Talk { npc_id: String },
    /// Reach a specific location
    ReachLocation { position: Vec3, radius: f32 },
}

/// A resolved quest objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub id: String,
    pub description: String,
    pub kind: ObjectiveKind,
}

impl Objective {
    pub fn kill(id: &str, enemy_id: &str, required_count: i32) -> Self {
        Self::new(id, ObjectiveKind::Kill {
            enemy_id: enemy_id.to_string(),
            required_count,
            spawn_locations: Vec::new(),
        })
    }

    pub fn collect(id: &str, item_id: &str, required_count: i32) -> Self {
        Self::new(id, ObjectiveKind::Collect {
            item_id: item_id.to_string(),
            required_count,
            consume_on_complete: false,
        })
    }

    pub fn talk(id: &str, npc_id: &str) -> Self {
        Self::new(id, ObjectiveKind::Talk {
            npc_id: npc_id.to_string(),
        })
    }

    pub fn reach(id: &str, position: Vec3, radius: f32) -> Self {
        Self::new(id, ObjectiveKind::ReachLocation { position, radius })
    }

    fn new(id: &str, kind: ObjectiveKind) -> Self {
        Self {
            id: id.to_string(),
            description: String::new(),
            kind,
        }
    }

    pub fn from_raw(index: usize, raw: &RawObjective) -> Result<Self, DefinitionError> {
        let target = || {
            raw.target
                .clone()
                .ok_or_else(|| DefinitionError::MissingTarget(raw.id.clone()))
        };
        let kind = match raw.objective_type.to_lowercase().as_str() {
            "kill" | "kill_monster" => ObjectiveKind::Kill {
                enemy_id: target()?,
                required_count: raw.count,
                spawn_locations: raw.spawn_locations.clone(),
            },
            "collect" | "collect_item" => ObjectiveKind::Collect {
                item_id: target()?,
                required_count: raw.count,
                consume_on_complete: raw.consume_on_complete,
            },
            "talk" | "talk_to" => ObjectiveKind::Talk { npc_id: target()? },
            "reach_location" | "reach" | "location" => ObjectiveKind::ReachLocation {
                position: raw
                    .position
                    .ok_or_else(|| DefinitionError::MissingPosition(raw.id.clone()))?,
                radius: raw.radius,
            },
            _ => {
                return Err(DefinitionError::UnknownObjective {
                    kind: raw.objective_type.clone(),
                    index,
                })
            }
        };
        Ok(Self {
            id: raw.id.clone(),
            description: raw.description.clone(),
            kind,
        })
    }

    /// Evaluate a recorded progress value against this objective.
    ///
    /// Missing or wrong-typed progress never completes an objective.
    pub fn is_completed(&self, progress: Option<&Progress>) -> bool {
        match (&self.kind, progress) {
            (ObjectiveKind::Kill { required_count, .. }, Some(Progress::Count(n)))
            | (ObjectiveKind::Collect { required_count, .. }, Some(Progress::Count(n))) => {
                n >= required_count
            }
            (ObjectiveKind::Talk { .. }, Some(Progress::Flag(done)))
            | (ObjectiveKind::ReachLocation { .. }, Some(Progress::Flag(done))) => *done,
            _ => false,
        }
    }
}

/// Reward granted when a quest completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reward {
    Experience { amount: i32 },
    Item { item_id: String, count: i32 },
    Currency { currency: String, amount: i32 },
    Equipment { equipment_id: String },
}

impl Reward {
    pub fn from_raw(index: usize, raw: &RawReward) -> Result<Self, DefinitionError> {
        let id = || raw.id.clone().ok_or(DefinitionError::MissingRewardId(index));
        match raw.reward_type.to_lowercase().as_str() {
            "experience" | "exp" => Ok(Reward::Experience { amount: raw.amount }),
            "item" => Ok(Reward::Item {
                item_id: id()?,
                count: raw.count,
            }),
            "currency" | "gold" => Ok(Reward::Currency {
                currency: raw.currency.clone().unwrap_or_else(|| "gold".to_string()),
                amount: raw.amount,
            }),
            "equipment" => Ok(Reward::Equipment { equipment_id: id()? }),
            _ => Err(DefinitionError::UnknownReward {
                kind: raw.reward_type.clone(),
                index,
            }),
        }
    }
}

/// Ways an NPC takes part in a quest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NpcTalkType {
    Accept,
    HandIn,
    Progress,
    Complete,
}

/// NPC linked to a quest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcAssociation {
    pub npc_id: String,
    #[serde(default)]
    pub talk_types: Vec<NpcTalkType>,
}

/// When a scene trigger fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    OnStart,
    OnComplete,
    OnObjective,
}

/// Cutscene or scene change tied to a quest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneTrigger {
    pub scene_id: String,
    pub trigger: TriggerType,
    #[serde(default)]
    pub animation: Option<String>,
    #[serde(default)]
    pub skippable: bool,
}

/// A fully resolved quest definition
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QuestDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: QuestKind,
    /// Quest line this quest advances
    pub quest_line_id: Option<String>,
    /// Position hint within the line, not enforced
    pub quest_line_order: i32,
    pub dependencies: Vec<Dependency>,
    pub objectives: Vec<Objective>,
    pub rewards: Vec<Reward>,
    /// Achievement ids fired on completion
    pub achievements: Vec<String>,
    pub npc_associations: Vec<NpcAssociation>,
    pub scene_triggers: Vec<SceneTrigger>,
}

impl QuestDefinition {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Create a QuestDefinition from raw TOML data
    pub fn from_raw(raw: &RawQuest) -> Result<Self, DefinitionError> {
        let dependencies = raw
            .dependencies
            .iter()
            .enumerate()
            .map(|(i, d)| Dependency::from_raw(i, d))
            .collect::<Result<Vec<_>, _>>()?;
        let objectives = raw
            .objectives
            .iter()
            .enumerate()
            .map(|(i, o)| Objective::from_raw(i, o))
            .collect::<Result<Vec<_>, _>>()?;
        let rewards = raw
            .rewards
            .iter()
            .enumerate()
            .map(|(i, r)| Reward::from_raw(i, r))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            id: raw.id.clone(),
            name: raw.name.clone(),
            description: raw.description.clone(),
            kind: raw.kind,
            quest_line_id: raw.quest_line_id.clone(),
            quest_line_order: raw.quest_line_order,
            dependencies,
            objectives,
            rewards,
            achievements: raw.achievements.clone(),
            npc_associations: raw.npc_associations.clone(),
            scene_triggers: raw.scene_triggers.clone(),
        })
    }

    /// Get objective by ID
    pub fn get_objective(&self, id: &str) -> Option<&Objective> {
        self.objectives.iter().find(|o| o.id == id)
    }

    /// Check whether an NPC plays the given role in this quest
    pub fn involves_npc(&self, npc_id: &str, talk_type: NpcTalkType) -> bool {
        self.npc_associations
            .iter()
            .any(|a| a.npc_id == npc_id && a.talk_types.contains(&talk_type))
    }

    pub fn scene_triggers_for(&self, trigger: TriggerType) -> impl Iterator<Item = &SceneTrigger> {
        self.scene_triggers.iter().filter(move |t| t.trigger == trigger)
    }
}
