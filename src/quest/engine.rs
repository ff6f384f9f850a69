//! Quest Engine
//!
//! Owns quest status and objective progress, drives the quest state machine
//! and cascades completions into rewards and quest lines.

use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::definition::{
    Dependency, DependencyCondition, NpcTalkType, ObjectiveKind, QuestDefinition, SceneTrigger,
    TriggerType,
};
use super::events::{GameEvent, QuestNotification};
use super::registry::DefinitionSource;
use super::reward::{LoggingRewardSink, RewardSink};
use super::state::{Progress, QuestRuntimeState, QuestStatus};
use crate::quest_line::{NodeState, QuestLineDefinition, QuestLineEngine};
use crate::save::{QuestSnapshot, SnapshotStore};

/// Single-writer container for all quest runtime state
pub struct QuestEngine<R: RewardSink = LoggingRewardSink> {
    /// Quest definitions in load order
    quests: Vec<QuestDefinition>,
    /// quest_id -> position in `quests`
    index: HashMap<String, usize>,
    /// Runtime state, created lazily
    states: HashMap<String, QuestRuntimeState>,
    quest_lines: QuestLineEngine,
    rewards: R,
    store: Option<Box<dyn SnapshotStore>>,
    notifications: Vec<QuestNotification>,
}

impl<R: RewardSink> QuestEngine<R> {
    pub fn new(
        quests: Vec<QuestDefinition>,
        quest_lines: Vec<QuestLineDefinition>,
        rewards: R,
    ) -> Self {
        let mut index = HashMap::with_capacity(quests.len());
        for (i, quest) in quests.iter().enumerate() {
            if index.insert(quest.id.clone(), i).is_some() {
                warn!("Duplicate quest ID '{}', later definition wins", quest.id);
            }
        }

        let quest_lines = QuestLineEngine::new(quest_lines);
        validate_quests(&quests, &index, &quest_lines);
        info!("Quest engine ready with {} quests", quests.len());

        Self {
            quests,
            index,
            states: HashMap::new(),
            quest_lines,
            rewards,
            store: None,
            notifications: Vec::new(),
        }
    }

    /// Build an engine from everything a definition source provides
    pub fn from_source(source: &dyn DefinitionSource, rewards: R) -> Self {
        Self::new(
            source.quest_definitions(),
            source.quest_line_definitions(),
            rewards,
        )
    }

    /// Persist through `store` after every state transition
    pub fn with_store(mut self, store: Box<dyn SnapshotStore>) -> Self {
        self.store = Some(store);
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Get a quest definition by ID
    pub fn quest(&self, quest_id: &str) -> Option<&QuestDefinition> {
        self.index.get(quest_id).map(|&i| &self.quests[i])
    }

    pub fn definitions(&self) -> &[QuestDefinition] {
        &self.quests
    }

    /// Stored status, or `None` if the quest was never started
    pub fn status(&self, quest_id: &str) -> QuestStatus {
        self.states
            .get(quest_id)
            .map(|s| s.status)
            .unwrap_or(QuestStatus::None)
    }

    pub fn progress(&self, quest_id: &str, objective_id: &str) -> Option<Progress> {
        self.states
            .get(quest_id)
            .and_then(|s| s.get_progress(objective_id))
            .copied()
    }

    pub fn runtime_state(&self, quest_id: &str) -> Option<&QuestRuntimeState> {
        self.states.get(quest_id)
    }

    /// Check if a quest can be started right now.
    ///
    /// Every dependency must hold; the dependency operator is not consulted.
    pub fn can_start(&self, quest_id: &str) -> bool {
        let Some(quest) = self.quest(quest_id) else {
            return false;
        };
        if self.status(quest_id) != QuestStatus::None {
            return false;
        }
        quest.dependencies.iter().all(|d| self.check_dependency(d))
    }

    fn check_dependency(&self, dependency: &Dependency) -> bool {
        match &dependency.condition {
            DependencyCondition::QuestCompleted(id) => self.status(id) == QuestStatus::Completed,
            DependencyCondition::QuestInProgress(id) => self.status(id) == QuestStatus::InProgress,
            DependencyCondition::LevelAtLeast(_) => true,
        }
    }

    /// Quests that can be started, in definition order
    pub fn available_quests(&self) -> Vec<&QuestDefinition> {
        self.quests.iter().filter(|q| self.can_start(&q.id)).collect()
    }

    pub fn active_quests(&self) -> Vec<&QuestDefinition> {
        self.quests_with_status(QuestStatus::InProgress)
    }

    pub fn completed_quests(&self) -> Vec<&QuestDefinition> {
        self.quests_with_status(QuestStatus::Completed)
    }

    fn quests_with_status(&self, status: QuestStatus) -> Vec<&QuestDefinition> {
        self.quests
            .iter()
            .filter(|q| self.status(&q.id) == status)
            .collect()
    }

    /// Quests in which an NPC plays the given role
    pub fn quests_for_npc(&self, npc_id: &str, talk_type: NpcTalkType) -> Vec<&QuestDefinition> {
        self.quests
            .iter()
            .filter(|q| q.involves_npc(npc_id, talk_type))
            .collect()
    }

    pub fn scene_triggers(&self, quest_id: &str, trigger: TriggerType) -> Vec<&SceneTrigger> {
        self.quest(quest_id)
            .map(|q| q.scene_triggers_for(trigger).collect())
            .unwrap_or_default()
    }

    pub fn quest_lines(&self) -> &QuestLineEngine {
        &self.quest_lines
    }

    /// Direct access to the quest line engine. Notifications it queues are
    /// moved into the engine queue before the next engine mutation, so
    /// `drain_notifications` keeps emission order.
    pub fn quest_lines_mut(&mut self) -> &mut QuestLineEngine {
        &mut self.quest_lines
    }

    pub fn rewards(&self) -> &R {
        &self.rewards
    }

    pub fn rewards_mut(&mut self) -> &mut R {
        &mut self.rewards
    }

    pub fn pending_notifications(&self) -> &[QuestNotification] {
        &self.notifications
    }

    /// Take all queued notifications in emission order
    pub fn drain_notifications(&mut self) -> Vec<QuestNotification> {
        self.flush_line_notifications();
        std::mem::take(&mut self.notifications)
    }

    fn flush_line_notifications(&mut self) {
        self.notifications
            .extend(self.quest_lines.drain_notifications());
    }

    // ========================================================================
    // Mutators
    // ========================================================================

    /// Start a quest if it can be started
    pub fn start(&mut self, quest_id: &str) {
        self.flush_line_notifications();
        if self.quest(quest_id).is_none() {
            warn!("Cannot start unknown quest '{}'", quest_id);
            return;
        }
        if !self.can_start(quest_id) {
            debug!("Quest '{}' cannot be started (status {})", quest_id, self.status(quest_id).as_str());
            return;
        }

        self.states
            .insert(quest_id.to_string(), QuestRuntimeState::started());
        info!("Quest '{}' started", quest_id);
        self.notifications.push(QuestNotification::QuestStatusChanged {
            quest_id: quest_id.to_string(),
            status: QuestStatus::InProgress,
        });
        self.fire_scene_triggers(quest_id, TriggerType::OnStart);
        self.persist();
    }

    /// Record progress on an objective and complete the quest once every
    /// objective is satisfied.
    ///
    /// Progress is recorded even when the quest was never started; such
    /// quests still cannot complete.
    pub fn update_progress(&mut self, quest_id: &str, objective_id: &str, value: impl Into<Progress>) {
        self.flush_line_notifications();
        let value = value.into();
        let Some(&idx) = self.index.get(quest_id) else {
            warn!("Progress update for unknown quest '{}'", quest_id);
            return;
        };

        let mut objective_reached = false;
        match self.quests[idx].get_objective(objective_id) {
            Some(objective) => {
                let state = self.states.entry(quest_id.to_string()).or_default();
                let was_completed = objective.is_completed(state.get_progress(objective_id));
                state.set_progress(objective_id, value);
                debug!("Quest '{}' objective '{}' progress: {:?}", quest_id, objective_id, value);

                if !was_completed && objective.is_completed(Some(&value)) {
                    info!("Quest '{}' objective '{}' completed", quest_id, objective_id);
                    objective_reached = state.status == QuestStatus::InProgress;
                }
            }
            None => warn!(
                "Quest '{}' has no objective '{}', progress ignored",
                quest_id, objective_id
            ),
        }

        if objective_reached {
            self.fire_scene_triggers(quest_id, TriggerType::OnObjective);
        }
        self.check_completion(idx);
    }

    fn check_completion(&mut self, idx: usize) {
        let quest = &self.quests[idx];
        let state = self.states.get(&quest.id);
        let all_done = quest
            .objectives
            .iter()
            .all(|o| o.is_completed(state.and_then(|s| s.get_progress(&o.id))));

        if all_done {
            let quest_id = quest.id.clone();
            self.complete(&quest_id);
        }
    }

    /// Complete an in-progress quest: grant rewards, fire achievements and
    /// advance its quest line.
    pub fn complete(&mut self, quest_id: &str) {
        self.flush_line_notifications();
        let Some(&idx) = self.index.get(quest_id) else {
            warn!("Cannot complete unknown quest '{}'", quest_id);
            return;
        };
        let Some(state) = self
            .states
            .get_mut(quest_id)
            .filter(|s| s.status == QuestStatus::InProgress)
        else {
            debug!("Quest '{}' is not in progress, ignoring completion", quest_id);
            return;
        };

        state.status = QuestStatus::Completed;
        info!("Quest '{}' completed", quest_id);
        self.notifications.push(QuestNotification::QuestStatusChanged {
            quest_id: quest_id.to_string(),
            status: QuestStatus::Completed,
        });
        self.notifications.push(QuestNotification::QuestCompleted {
            quest_id: quest_id.to_string(),
        });

        let quest = &self.quests[idx];
        for reward in &quest.rewards {
            if let Err(e) = reward.grant(&mut self.rewards) {
                warn!("Failed to grant reward {:?} for quest '{}': {}", reward, quest_id, e);
            }
        }

        for achievement_id in &quest.achievements {
            info!("Triggering achievement: {}", achievement_id);
            self.notifications.push(QuestNotification::AchievementTriggered {
                quest_id: quest_id.to_string(),
                achievement_id: achievement_id.clone(),
            });
        }

        self.fire_scene_triggers(quest_id, TriggerType::OnComplete);

        let quest = &self.quests[idx];
        self.quest_lines.on_quest_completed(quest);
        self.flush_line_notifications();

        self.persist();
    }

    /// Fail an in-progress quest. Failure is terminal.
    pub fn fail(&mut self, quest_id: &str) {
        self.flush_line_notifications();
        if self.quest(quest_id).is_none() {
            warn!("Cannot fail unknown quest '{}'", quest_id);
            return;
        }
        let Some(state) = self
            .states
            .get_mut(quest_id)
            .filter(|s| s.status == QuestStatus::InProgress)
        else {
            debug!("Quest '{}' is not in progress, ignoring failure", quest_id);
            return;
        };

        state.status = QuestStatus::Failed;
        info!("Quest '{}' failed", quest_id);
        self.notifications.push(QuestNotification::QuestStatusChanged {
            quest_id: quest_id.to_string(),
            status: QuestStatus::Failed,
        });
        self.notifications.push(QuestNotification::QuestFailed {
            quest_id: quest_id.to_string(),
        });
        self.persist();
    }

    /// Route a game event to the matching objectives of every active quest
    pub fn handle_event(&mut self, event: &GameEvent) {
        let mut updates: Vec<(String, String, Progress)> = Vec::new();

        for quest in &self.quests {
            if self.status(&quest.id) != QuestStatus::InProgress {
                continue;
            }
            for objective in &quest.objectives {
                let current = self.progress(&quest.id, &objective.id);
                if objective.is_completed(current.as_ref()) {
                    continue;
                }
                let count = current.and_then(|p| p.as_count()).unwrap_or(0);

                let next = match (&objective.kind, event) {
                    (ObjectiveKind::Kill { enemy_id, .. }, GameEvent::EnemyKilled { enemy_id: killed })
                        if enemy_id == killed =>
                    {
                        Some(Progress::Count(count.saturating_add(1)))
                    }
                    (
                        ObjectiveKind::Collect { item_id, .. },
                        GameEvent::ItemCollected { item_id: collected, count: amount },
                    ) if item_id == collected => {
                        Some(Progress::Count(count.saturating_add(*amount)))
                    }
                    (ObjectiveKind::Talk { npc_id }, GameEvent::NpcTalkedTo { npc_id: talked })
                        if npc_id == talked =>
                    {
                        Some(Progress::Flag(true))
                    }
                    (
                        ObjectiveKind::ReachLocation { position, radius },
                        GameEvent::LocationReached { position: reached },
                    ) if position.distance(reached) <= *radius => Some(Progress::Flag(true)),
                    _ => None,
                };

                if let Some(value) = next {
                    updates.push((quest.id.clone(), objective.id.clone(), value));
                }
            }
        }

        if updates.is_empty() {
            debug!("Event {} matched no active objective", event.event_type());
        }
        for (quest_id, objective_id, value) in updates {
            self.update_progress(&quest_id, &objective_id, value);
        }
    }

    fn fire_scene_triggers(&mut self, quest_id: &str, trigger: TriggerType) {
        let Some(quest) = self.index.get(quest_id).map(|&i| &self.quests[i]) else {
            return;
        };
        for scene in quest.scene_triggers_for(trigger) {
            debug!("Quest '{}' triggers scene '{}'", quest_id, scene.scene_id);
            self.notifications.push(QuestNotification::SceneTriggered {
                quest_id: quest_id.to_string(),
                scene_id: scene.scene_id.clone(),
                animation: scene.animation.clone(),
                skippable: scene.skippable,
            });
        }
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Flat copy of quest and node state for the save layer
    pub fn snapshot(&self) -> QuestSnapshot {
        let quest_statuses = self
            .states
            .iter()
            .filter(|(_, s)| s.status != QuestStatus::None)
            .map(|(id, s)| (id.clone(), s.status.as_i32()))
            .collect();
        let quest_progress = self
            .states
            .iter()
            .filter(|(_, s)| !s.progress.is_empty())
            .map(|(id, s)| (id.clone(), s.progress.clone()))
            .collect();
        let quest_line_node_states = self
            .quest_lines
            .all_node_states()
            .iter()
            .map(|(id, state)| (id.clone(), state.as_i32()))
            .collect();

        QuestSnapshot {
            quest_statuses,
            quest_progress,
            quest_line_node_states,
        }
    }

    /// Replace all runtime state with the snapshot's contents
    pub fn restore(&mut self, snapshot: &QuestSnapshot) {
        let mut states: HashMap<String, QuestRuntimeState> = HashMap::new();

        for (quest_id, &code) in &snapshot.quest_statuses {
            match QuestStatus::from_i32(code) {
                Some(QuestStatus::None) => {}
                Some(status) => states.entry(quest_id.clone()).or_default().status = status,
                None => warn!("Ignoring invalid status {} for quest '{}'", code, quest_id),
            }
        }
        for (quest_id, progress) in &snapshot.quest_progress {
            states.entry(quest_id.clone()).or_default().progress = progress.clone();
        }

        let mut node_states = HashMap::new();
        for (node_id, &code) in &snapshot.quest_line_node_states {
            match NodeState::from_i32(code) {
                Some(state) => {
                    node_states.insert(node_id.clone(), state);
                }
                None => warn!("Ignoring invalid state {} for node '{}'", code, node_id),
            }
        }

        info!(
            "Restored {} quest states and {} node states",
            states.len(),
            node_states.len()
        );
        self.states = states;
        self.quest_lines.restore_node_states(node_states);
    }

    /// Write the current snapshot to the attached store
    pub fn save_to_store(&mut self) {
        self.persist();
    }

    /// Restore from the attached store. Returns true if a snapshot was applied.
    pub fn load_from_store(&mut self) -> bool {
        let Some(store) = self.store.as_mut() else {
            return false;
        };
        match store.load() {
            Ok(Some(snapshot)) => {
                self.restore(&snapshot);
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!("Failed to load quest snapshot: {}", e);
                false
            }
        }
    }

    fn persist(&mut self) {
        if self.store.is_none() {
            return;
        }
        let snapshot = self.snapshot();
        if let Some(store) = self.store.as_mut() {
            if let Err(e) = store.save(&snapshot) {
                warn!("Failed to save quest snapshot: {}", e);
            }
        }
    }
}

/// Warn about references to quests or quest lines that do not exist
fn validate_quests(
    quests: &[QuestDefinition],
    index: &HashMap<String, usize>,
    quest_lines: &QuestLineEngine,
) {
    for quest in quests {
        for dependency in &quest.dependencies {
            if let Some(dep_id) = dependency.quest_id() {
                if !index.contains_key(dep_id) {
                    warn!(
                        "Quest '{}' depends on non-existent quest '{}'",
                        quest.id, dep_id
                    );
                }
            }
        }
        if let Some(line_id) = &quest.quest_line_id {
            if quest_lines.line(line_id).is_none() {
                warn!(
                    "Quest '{}' references non-existent quest line '{}'",
                    quest.id, line_id
                );
            }
        }
    }
}
