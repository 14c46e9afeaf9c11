pub mod history;
pub mod init;
pub mod run;
pub mod score;
pub mod tree;
pub mod validate;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::Table;

use adaptest_core::{EvaluationResult, EvaluationSession, QuestionBank};
use adaptest_providers::config::{load_bank, load_config_from, AdaptestConfig};

/// Load config, applying a command-line bank override.
pub fn load_setup(
    config_path: Option<&Path>,
    bank_override: Option<PathBuf>,
) -> Result<(AdaptestConfig, Arc<QuestionBank>)> {
    let mut config = load_config_from(config_path)?;
    if bank_override.is_some() {
        config.bank = bank_override;
    }
    let bank = load_bank(&config)?;
    tracing::debug!(questions = bank.len(), alternatives = ?config.alternatives, "setup loaded");
    Ok((config, Arc::new(bank)))
}

pub fn load_session(path: &Path) -> Result<EvaluationSession> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read session from {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("failed to parse session JSON in {}", path.display()))
}

pub fn print_result(result: &EvaluationResult) {
    let mut table = Table::new();
    table.set_header(vec!["Level", "Score", "Learning style"]);
    table.add_row(vec![
        result.level.to_string(),
        format!("{}%", result.score),
        result.learning_style.to_string(),
    ]);
    println!("{table}");

    let mut topics = Table::new();
    topics.set_header(vec!["Topic", "Score"]);
    for (topic, pct) in &result.topics {
        topics.add_row(vec![topic.clone(), format!("{pct}%")]);
    }
    println!("{topics}");

    println!("\nRecommendations:");
    for rec in &result.recommendations {
        println!("  - {rec}");
    }
}
