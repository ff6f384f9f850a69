//! Quest Line Engine
//!
//! Tracks node state for every quest line and advances the graph as quests
//! complete.

use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

use super::definition::{NodeState, QuestLineDefinition, QuestLineNode};
use crate::quest::{QuestDefinition, QuestNotification};

/// Owns per-node state for all quest lines
#[derive(Debug, Default)]
pub struct QuestLineEngine {
    /// Loaded quest line definitions, in load order
    lines: Vec<QuestLineDefinition>,
    /// Recorded node states (absent means locked)
    node_states: HashMap<String, NodeState>,
    /// Notifications waiting to be drained
    notifications: Vec<QuestNotification>,
}

impl QuestLineEngine {
    pub fn new(lines: Vec<QuestLineDefinition>) -> Self {
        validate_lines(&lines);
        info!("Loaded {} quest lines", lines.len());
        Self {
            lines,
            node_states: HashMap::new(),
            notifications: Vec::new(),
        }
    }

    /// Get a quest line by ID
    pub fn line(&self, line_id: &str) -> Option<&QuestLineDefinition> {
        self.lines.iter().find(|l| l.id == line_id)
    }

    pub fn lines(&self) -> &[QuestLineDefinition] {
        &self.lines
    }

    /// First line that contains the node
    pub fn line_of_node(&self, node_id: &str) -> Option<&QuestLineDefinition> {
        self.lines.iter().find(|l| l.contains_node(node_id))
    }

    fn is_known_node(&self, node_id: &str) -> bool {
        self.line_of_node(node_id).is_some()
    }

    pub fn node_state(&self, node_id: &str) -> NodeState {
        self.node_states.get(node_id).copied().unwrap_or_default()
    }

    /// Overwrite a node's state without side effects
    pub fn set_node_state(&mut self, node_id: &str, state: NodeState) {
        self.node_states.insert(node_id.to_string(), state);
    }

    /// Mark a node available regardless of its current state
    pub fn unlock(&mut self, node_id: &str) {
        if !self.is_known_node(node_id) {
            warn!("Cannot unlock unknown quest line node '{}'", node_id);
            return;
        }
        debug!("Unlocking quest line node '{}'", node_id);
        self.node_states.insert(node_id.to_string(), NodeState::Available);
    }

    /// Complete a node, unlock its locked successors and check line completion
    pub fn complete_node(&mut self, node_id: &str) {
        let Some(line) = self.line_of_node(node_id) else {
            warn!("Cannot complete unknown quest line node '{}'", node_id);
            return;
        };
        let line_id = line.id.clone();
        let next_nodes: Vec<String> = line
            .get_node(node_id)
            .map(|node| {
                node.next_nodes
                    .iter()
                    .filter(|next| line.contains_node(next))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        self.node_states.insert(node_id.to_string(), NodeState::Completed);
        info!("Quest line '{}' progressed: node '{}' completed", line_id, node_id);
        self.notifications.push(QuestNotification::QuestLineProgressed {
            line_id: line_id.clone(),
            node_id: node_id.to_string(),
        });

        for next in &next_nodes {
            if self.node_state(next) == NodeState::Locked {
                self.unlock(next);
            }
        }

        if self.is_line_completed(&line_id) {
            info!("Quest line '{}' completed", line_id);
            self.notifications
                .push(QuestNotification::QuestLineCompleted { line_id });
        }
    }

    /// Complete the first node of the quest's line that references it
    pub fn on_quest_completed(&mut self, quest: &QuestDefinition) {
        let Some(line_id) = quest.quest_line_id.as_deref() else {
            return;
        };
        let Some(line) = self.line(line_id) else {
            warn!(
                "Quest '{}' references non-existent quest line '{}'",
                quest.id, line_id
            );
            return;
        };

        match line.nodes.iter().find(|n| n.references_quest(&quest.id)) {
            Some(node) => {
                let node_id = node.id.clone();
                self.complete_node(&node_id);
            }
            None => debug!(
                "Quest '{}' does not complete any node of quest line '{}'",
                quest.id, line_id
            ),
        }
    }

    /// Check if every node of a line is completed
    pub fn is_line_completed(&self, line_id: &str) -> bool {
        self.line(line_id).is_some_and(|line| {
            line.nodes
                .iter()
                .all(|n| self.node_state(&n.id) == NodeState::Completed)
        })
    }

    pub fn available_nodes(&self, line_id: &str) -> Vec<&QuestLineNode> {
        self.nodes_in_state(line_id, NodeState::Available)
    }

    pub fn completed_nodes(&self, line_id: &str) -> Vec<&QuestLineNode> {
        self.nodes_in_state(line_id, NodeState::Completed)
    }

    fn nodes_in_state(&self, line_id: &str, state: NodeState) -> Vec<&QuestLineNode> {
        self.line(line_id)
            .map(|line| {
                line.nodes
                    .iter()
                    .filter(|n| self.node_state(&n.id) == state)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Nodes of a line with no predecessor
    pub fn entry_nodes(&self, line_id: &str) -> Vec<&QuestLineNode> {
        self.line(line_id)
            .map(|line| line.entry_nodes().collect())
            .unwrap_or_default()
    }

    /// Unlock every locked entry node of a line
    pub fn unlock_entry_nodes(&mut self, line_id: &str) {
        let entries: Vec<String> = self
            .entry_nodes(line_id)
            .into_iter()
            .filter(|n| self.node_state(&n.id) == NodeState::Locked)
            .map(|n| n.id.clone())
            .collect();
        for node_id in entries {
            self.unlock(&node_id);
        }
    }

    /// Recorded node states, for snapshotting
    pub fn all_node_states(&self) -> &HashMap<String, NodeState> {
        &self.node_states
    }

    /// Replace all node states. Entries for unknown nodes are kept as-is.
    pub fn restore_node_states(&mut self, states: HashMap<String, NodeState>) {
        self.node_states = states;
    }

    pub fn pending_notifications(&self) -> &[QuestNotification] {
        &self.notifications
    }

    /// Take all queued notifications in emission order
    pub fn drain_notifications(&mut self) -> Vec<QuestNotification> {
        std::mem::take(&mut self.notifications)
    }
}

/// Warn about duplicate ids and dangling successor references
fn validate_lines(lines: &[QuestLineDefinition]) {
    let mut line_ids = HashSet::new();
    let mut node_ids = HashSet::new();

    for line in lines {
        if !line_ids.insert(line.id.as_str()) {
            warn!("Duplicate quest line ID '{}'", line.id);
        }
        for node in &line.nodes {
            if !node_ids.insert(node.id.as_str()) {
                warn!(
                    "Quest line node '{}' appears more than once (line '{}')",
                    node.id, line.id
                );
            }
            for next in &node.next_nodes {
                if !line.contains_node(next) {
                    warn!(
                        "Node '{}' in quest line '{}' references non-existent node '{}'",
                        node.id, line.id, next
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn branching_line() -> QuestLineDefinition {
        QuestLineDefinition::new(
            "L",
            vec![
                QuestLineNode::new("N1").with_quests(&["q1"]).with_next(&["N2", "N3"]),
                QuestLineNode::new("N2").with_quests(&["q2"]),
                QuestLineNode::new("N3").with_quests(&["q3"]),
            ],
        )
    }

    #[test]
    fn test_unrecorded_nodes_are_locked() {
        let engine = QuestLineEngine::new(vec![branching_line()]);
        assert_eq!(engine.node_state("N1"), NodeState::Locked);
        assert_eq!(engine.node_state("nowhere"), NodeState::Locked);
    }

    #[test]
    fn test_cascade_unlock() {
        let mut engine = QuestLineEngine::new(vec![branching_line()]);
        engine.unlock("N1");
        engine.complete_node("N1");

        assert_eq!(engine.node_state("N1"), NodeState::Completed);
        assert_eq!(engine.node_state("N2"), NodeState::Available);
        assert_eq!(engine.node_state("N3"), NodeState::Available);
        assert_eq!(
            engine.drain_notifications(),
            vec![QuestNotification::QuestLineProgressed {
                line_id: "L".to_string(),
                node_id: "N1".to_string(),
            }]
        );
        assert_eq!(engine.available_nodes("L").len(), 2);
        assert_eq!(engine.completed_nodes("L").len(), 1);
    }

    #[test]
    fn test_line_completion_fires_on_last_node() {
        let line = QuestLineDefinition::new(
            "L",
            vec![
                QuestLineNode::new("N1").with_next(&["N2"]),
                QuestLineNode::new("N2"),
            ],
        );
        let mut engine = QuestLineEngine::new(vec![line]);

        engine.complete_node("N1");
        assert!(!engine.is_line_completed("L"));
        assert!(!engine
            .drain_notifications()
            .iter()
            .any(|n| matches!(n, QuestNotification::QuestLineCompleted { .. })));

        engine.complete_node("N2");
        assert!(engine.is_line_completed("L"));
        assert_eq!(
            engine.drain_notifications(),
            vec![
                QuestNotification::QuestLineProgressed {
                    line_id: "L".to_string(),
                    node_id: "N2".to_string(),
                },
                QuestNotification::QuestLineCompleted { line_id: "L".to_string() },
            ]
        );
    }

    #[test]
    fn test_any_predecessor_unlocks_join_node() {
        let line = QuestLineDefinition::new(
            "L",
            vec![
                QuestLineNode::new("A").with_next(&["join"]),
                QuestLineNode::new("B").with_next(&["join"]),
                QuestLineNode::new("join"),
            ],
        );
        let mut engine = QuestLineEngine::new(vec![line]);

        engine.complete_node("A");
        assert_eq!(engine.node_state("B"), NodeState::Locked);
        assert_eq!(engine.node_state("join"), NodeState::Available);
    }

    #[test]
    fn test_completed_successor_is_not_relocked() {
        let mut engine = QuestLineEngine::new(vec![branching_line()]);
        engine.complete_node("N2");
        engine.complete_node("N1");

        assert_eq!(engine.node_state("N2"), NodeState::Completed);
        assert_eq!(engine.node_state("N3"), NodeState::Available);
    }

    #[test]
    fn test_successor_outside_line_is_ignored() {
        let line = QuestLineDefinition::new("L", vec![QuestLineNode::new("N1").with_next(&["ghost"])]);
        let mut engine = QuestLineEngine::new(vec![line]);

        engine.complete_node("N1");
        assert!(!engine.all_node_states().contains_key("ghost"));
    }

    #[test]
    fn test_unknown_node_is_noop() {
        let mut engine = QuestLineEngine::new(vec![branching_line()]);
        engine.complete_node("nonexistent");
        engine.unlock("nonexistent");

        assert!(engine.all_node_states().is_empty());
        assert!(engine.pending_notifications().is_empty());
    }

    #[test]
    fn test_quest_completion_completes_first_matching_node() {
        let line = QuestLineDefinition::new(
            "L",
            vec![
                QuestLineNode::new("first").with_quests(&["shared"]),
                QuestLineNode::new("second").with_quests(&["shared"]),
            ],
        );
        let mut engine = QuestLineEngine::new(vec![line]);
        let mut quest = QuestDefinition::new("shared", "Shared");
        quest.quest_line_id = Some("L".to_string());

        engine.on_quest_completed(&quest);

        assert_eq!(engine.node_state("first"), NodeState::Completed);
        assert_eq!(engine.node_state("second"), NodeState::Locked);
    }

    #[test]
    fn test_quest_without_line_is_ignored() {
        let mut engine = QuestLineEngine::new(vec![branching_line()]);
        engine.on_quest_completed(&QuestDefinition::new("q1", "Loose"));

        let mut stray = QuestDefinition::new("q1", "Stray");
        stray.quest_line_id = Some("missing".to_string());
        engine.on_quest_completed(&stray);

        assert!(engine.all_node_states().is_empty());
    }

    #[test]
    fn test_restore_keeps_unknown_nodes() {
        let mut engine = QuestLineEngine::new(vec![branching_line()]);
        engine.complete_node("N1");

        let mut saved = HashMap::new();
        saved.insert("N2".to_string(), NodeState::Completed);
        saved.insert("removed_node".to_string(), NodeState::Available);
        engine.restore_node_states(saved);

        assert_eq!(engine.node_state("N1"), NodeState::Locked);
        assert_eq!(engine.node_state("N2"), NodeState::Completed);
        assert_eq!(engine.node_state("removed_node"), NodeState::Available);
        assert_eq!(engine.completed_nodes("L").len(), 1);
    }

    #[test]
    fn test_unlock_entry_nodes() {
        let mut engine = QuestLineEngine::new(vec![branching_line()]);
        engine.unlock_entry_nodes("L");

        assert_eq!(engine.node_state("N1"), NodeState::Available);
        assert_eq!(engine.node_state("N2"), NodeState::Locked);
        assert_eq!(engine.entry_nodes("L").len(), 1);
        assert!(engine.entry_nodes("missing").is_empty());
    }

    #[test]
    fn test_node_in_two_lines_processes_first_line_only() {
        let first = QuestLineDefinition::new(
            "L1",
            vec![QuestLineNode::new("N").with_next(&["A"]), QuestLineNode::new("A")],
        );
        let second = QuestLineDefinition::new(
            "L2",
            vec![QuestLineNode::new("N").with_next(&["B"]), QuestLineNode::new("B")],
        );
        let mut engine = QuestLineEngine::new(vec![first, second]);

        engine.complete_node("N");

        assert_eq!(engine.node_state("A"), NodeState::Available);
        assert_eq!(engine.node_state("B"), NodeState::Locked);
        assert_eq!(
            engine.drain_notifications(),
            vec![QuestNotification::QuestLineProgressed {
                line_id: "L1".to_string(),
                node_id: "N".to_string(),
            }]
        );
    }

    #[test]
    fn test_unlock_overrides_completed_node() {
        let mut engine = QuestLineEngine::new(vec![branching_line()]);
        engine.complete_node("N2");
        assert_eq!(engine.node_state("N2"), NodeState::Completed);

        engine.unlock("N2");
        assert_eq!(engine.node_state("N2"), NodeState::Available);
    }
}
