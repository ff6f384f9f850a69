//! Quest Definition Sources
//!
//! The engine reads its definitions once, at construction, from a
//! `DefinitionSource`. `TomlDefinitions` loads them from a data directory;
//! `StaticDefinitions` wraps definitions built in code.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::definition::{DefinitionError, QuestDefinition, RawQuestFile};
use crate::quest_line::{QuestLineDefinition, RawQuestLineFile};

/// Provider of quest and quest line definitions
pub trait DefinitionSource {
    fn quest_definitions(&self) -> Vec<QuestDefinition>;
    fn quest_line_definitions(&self) -> Vec<QuestLineDefinition>;
}

/// Definitions held in memory
#[derive(Debug, Clone, Default)]
pub struct StaticDefinitions {
    pub quests: Vec<QuestDefinition>,
    pub quest_lines: Vec<QuestLineDefinition>,
}

impl StaticDefinitions {
    pub fn new(quests: Vec<QuestDefinition>, quest_lines: Vec<QuestLineDefinition>) -> Self {
        Self { quests, quest_lines }
    }
}

impl DefinitionSource for StaticDefinitions {
    fn quest_definitions(&self) -> Vec<QuestDefinition> {
        self.quests.clone()
    }

    fn quest_line_definitions(&self) -> Vec<QuestLineDefinition> {
        self.quest_lines.clone()
    }
}

/// Definitions loaded from `quests/` and `quest_lines/` under a data directory
#[derive(Debug, Clone, Default)]
pub struct TomlDefinitions {
    quests: Vec<QuestDefinition>,
    quest_lines: Vec<QuestLineDefinition>,
}

impl TomlDefinitions {
    /// Load all quest and quest line files below `data_dir`
    pub fn load_from_directory(data_dir: &Path) -> Result<Self, DefinitionError> {
        let quests = load_tree(&data_dir.join("quests"), |content| {
            let raw: RawQuestFile = toml::from_str(content)?;
            Ok(raw.quest)
        })?
        .into_iter()
        .filter_map(|(path, raw)| match QuestDefinition::from_raw(&raw) {
            Ok(quest) => Some(quest),
            Err(e) => {
                warn!("Failed to resolve quest {:?}: {}", path, e);
                None
            }
        })
        .collect::<Vec<_>>();

        let quest_lines = load_tree(&data_dir.join("quest_lines"), |content| {
            let raw: RawQuestLineFile = toml::from_str(content)?;
            Ok(raw.quest_line)
        })?
        .into_iter()
        .map(|(_, line)| line)
        .collect::<Vec<_>>();

        let quests = dedup_by_id(quests, |q| &q.id, "quest");
        let quest_lines = dedup_by_id(quest_lines, |l| &l.id, "quest line");

        info!(
            "Loaded {} quest definitions and {} quest lines from {:?}",
            quests.len(),
            quest_lines.len(),
            data_dir
        );

        Ok(Self { quests, quest_lines })
    }

    pub fn quests(&self) -> &[QuestDefinition] {
        &self.quests
    }

    pub fn quest_lines(&self) -> &[QuestLineDefinition] {
        &self.quest_lines
    }
}

impl DefinitionSource for TomlDefinitions {
    fn quest_definitions(&self) -> Vec<QuestDefinition> {
        self.quests.clone()
    }

    fn quest_line_definitions(&self) -> Vec<QuestLineDefinition> {
        self.quest_lines.clone()
    }
}

/// Parse every `.toml` file below `dir`. Files that fail to parse are
/// skipped with a warning.
fn load_tree<T>(
    dir: &Path,
    parse: impl Fn(&str) -> Result<T, toml::de::Error>,
) -> Result<Vec<(PathBuf, T)>, DefinitionError> {
    if !dir.exists() {
        warn!("Definition directory does not exist: {:?}", dir);
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    collect_toml_files(dir, &mut paths)?;
    paths.sort();

    let mut loaded = Vec::with_capacity(paths.len());
    for path in paths {
        let content = std::fs::read_to_string(&path).map_err(|source| DefinitionError::Io {
            path: path.display().to_string(),
            source,
        })?;
        match parse(&content) {
            Ok(value) => loaded.push((path, value)),
            Err(e) => warn!("Failed to parse {:?}: {}", path, e),
        }
    }
    Ok(loaded)
}

/// Recursively collect TOML files
fn collect_toml_files(dir: &Path, paths: &mut Vec<PathBuf>) -> Result<(), DefinitionError> {
    let io_err = |source| DefinitionError::Io {
        path: dir.display().to_string(),
        source,
    };

    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            collect_toml_files(&path, paths)?;
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            paths.push(path);
        }
    }
    Ok(())
}

/// Later definitions replace earlier ones with the same id, keeping the
/// position of the first.
fn dedup_by_id<T>(items: Vec<T>, id: impl Fn(&T) -> &String, what: &str) -> Vec<T> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut out: Vec<T> = Vec::with_capacity(items.len());

    for item in items {
        let key = id(&item).clone();
        match index.get(&key) {
            Some(&pos) => {
                warn!("Duplicate {} ID '{}', overwriting", what, key);
                out[pos] = item;
            }
            None => {
                index.insert(key, out.len());
                out.push(item);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_quest_toml(id: &str, name: &str) -> String {
        format!(
            r#"
[quest]
id = "{id}"
name = "{name}"
quest_line_id = "prologue"

[[quest.objectives]]
id = "obj1"
type = "kill"
target = "rat"
count = 3

[[quest.rewards]]
type = "experience"
amount = 50
"#
        )
    }

    const LINE_TOML: &str = r#"
[quest_line]
id = "prologue"
name = "Prologue"

[[quest_line.nodes]]
id = "cellar"
quest_ids = ["rat_problem"]
"#;

    #[test]
    fn test_load_definitions() {
        let temp_dir = TempDir::new().unwrap();
        let quest_dir = temp_dir.path().join("quests").join("chapter1");
        let line_dir = temp_dir.path().join("quest_lines");
        std::fs::create_dir_all(&quest_dir).unwrap();
        std::fs::create_dir_all(&line_dir).unwrap();

        std::fs::write(
            quest_dir.join("rats.toml"),
            create_test_quest_toml("rat_problem", "Rat Problem"),
        )
        .unwrap();
        std::fs::write(quest_dir.join("broken.toml"), "[quest]\nid = 12").unwrap();
        std::fs::write(quest_dir.join("notes.txt"), "ignored").unwrap();
        std::fs::write(line_dir.join("prologue.toml"), LINE_TOML).unwrap();

        let defs = TomlDefinitions::load_from_directory(temp_dir.path()).unwrap();

        assert_eq!(defs.quests().len(), 1);
        let quest = &defs.quest_definitions()[0];
        assert_eq!(quest.name, "Rat Problem");
        assert_eq!(quest.objectives.len(), 1);

        let lines = defs.quest_line_definitions();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains_node("cellar"));
    }

    #[test]
    fn test_duplicate_ids_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let quest_dir = temp_dir.path().join("quests");
        std::fs::create_dir_all(&quest_dir).unwrap();

        std::fs::write(quest_dir.join("a.toml"), create_test_quest_toml("dup", "First")).unwrap();
        std::fs::write(quest_dir.join("b.toml"), create_test_quest_toml("dup", "Second")).unwrap();

        let defs = TomlDefinitions::load_from_directory(temp_dir.path()).unwrap();
        assert_eq!(defs.quests().len(), 1);
        assert_eq!(defs.quests()[0].name, "Second");
    }

    #[test]
    fn test_missing_directories() {
        let temp_dir = TempDir::new().unwrap();
        let defs = TomlDefinitions::load_from_directory(temp_dir.path()).unwrap();
        assert!(defs.quests().is_empty());
        assert!(defs.quest_lines().is_empty());
    }
}
