//! Quest Line Definitions
//!
//! A quest line is a directed graph of narrative nodes. Nodes reference the
//! quests that complete them and the nodes they lead to.

use serde::{Deserialize, Serialize};

/// A quest line file as it appears on disk
#[derive(Debug, Clone, Deserialize)]
pub struct RawQuestLineFile {
    pub quest_line: QuestLineDefinition,
}

/// State of a single node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NodeState {
    #[default]
    Locked,
    Available,
    Completed,
}

impl NodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeState::Locked => "locked",
            NodeState::Available => "available",
            NodeState::Completed => "completed",
        }
    }

    /// Integer code used in save snapshots
    pub fn as_i32(&self) -> i32 {
        match self {
            NodeState::Locked => 0,
            NodeState::Available => 1,
            NodeState::Completed => 2,
        }
    }

    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            0 => Some(NodeState::Locked),
            1 => Some(NodeState::Available),
            2 => Some(NodeState::Completed),
            _ => None,
        }
    }
}

/// One node of a quest line graph
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestLineNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Quests whose completion completes this node
    #[serde(default)]
    pub quest_ids: Vec<String>,
    /// Successor node ids
    #[serde(default)]
    pub next_nodes: Vec<String>,
    /// Free-form requirement tags, informational only
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub is_branch_point: bool,
}

impl QuestLineNode {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Default::default()
        }
    }

    pub fn with_quests(mut self, quest_ids: &[&str]) -> Self {
        self.quest_ids = quest_ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_next(mut self, next_nodes: &[&str]) -> Self {
        self.next_nodes = next_nodes.iter().map(|s| s.to_string()).collect();
        self.is_branch_point = self.next_nodes.len() > 1;
        self
    }

    pub fn references_quest(&self, quest_id: &str) -> bool {
        self.quest_ids.iter().any(|q| q == quest_id)
    }
}

/// A full quest line
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct QuestLineDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Nodes in declaration order
    #[serde(default)]
    pub nodes: Vec<QuestLineNode>,
}

impl QuestLineDefinition {
    pub fn new(id: &str, nodes: Vec<QuestLineNode>) -> Self {
        Self {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            nodes,
        }
    }

    pub fn get_node(&self, node_id: &str) -> Option<&QuestLineNode> {
        self.nodes.iter().find(|n| n.id == node_id)
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.get_node(node_id).is_some()
    }

    /// Nodes that no other node in this line points at
    pub fn entry_nodes(&self) -> impl Iterator<Item = &QuestLineNode> {
        self.nodes.iter().filter(move |node| {
            !self
                .nodes
                .iter()
                .any(|other| other.next_nodes.iter().any(|next| *next == node.id))
        })
    }
}
