use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use questline_engine::config::{Config, DEFAULT_CONFIG_FILE};
use questline_engine::quest::{LoggingRewardSink, QuestEngine, TomlDefinitions};
use questline_engine::save::JsonFileStore;

fn main() {
    // Config path may be given as the first argument
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    let config = Config::load(&config_path);
    let filter = match &config {
        Ok(c) => c.log_filter.clone(),
        Err(_) => Config::default().log_filter,
    };

    let env_filter = match filter.parse() {
        Ok(directive) => EnvFilter::from_default_env().add_directive(directive),
        Err(_) => EnvFilter::new("questline_engine=info"),
    };
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let config = match config {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let definitions = match TomlDefinitions::load_from_directory(&config.data_dir) {
        Ok(defs) => defs,
        Err(e) => {
            error!("Failed to load quest definitions: {}", e);
            std::process::exit(1);
        }
    };

    let mut engine = QuestEngine::from_source(&definitions, LoggingRewardSink);
    if let Some(save_file) = &config.save_file {
        engine = engine.with_store(Box::new(JsonFileStore::new(save_file)));
        if engine.load_from_store() {
            info!("Restored quest progress from {:?}", save_file);
        }
    }

    let names = |quests: Vec<&questline_engine::QuestDefinition>| {
        quests
            .iter()
            .map(|q| q.id.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    info!("Available quests: [{}]", names(engine.available_quests()));
    info!("Active quests: [{}]", names(engine.active_quests()));
    info!("Completed quests: [{}]", names(engine.completed_quests()));

    let lines = engine.quest_lines();
    for line in lines.lines() {
        let states: Vec<String> = line
            .nodes
            .iter()
            .map(|n| format!("{}={}", n.id, lines.node_state(&n.id).as_str()))
            .collect();
        info!(
            "Quest line '{}'{}: {}",
            line.id,
            if lines.is_line_completed(&line.id) { " (completed)" } else { "" },
            states.join(", ")
        );
    }
}
