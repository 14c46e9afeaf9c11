//! The `adaptest history` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};

use adaptest_core::repository::JsonResultStore;
use adaptest_core::traits::ResultRepository;
use adaptest_providers::load_config_from;

pub async fn execute(user: String, output: Option<PathBuf>, config_path: Option<PathBuf>) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let dir = output.unwrap_or(config.results_dir);
    let store = JsonResultStore::new(&dir);

    let records = store.history(&user).await?;
    if records.is_empty() {
        println!("No results for {user} in {}", dir.display());
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Completed", "Session", "Level", "Score", "Style"]);
    for record in &records {
        table.add_row(vec![
            Cell::new(record.completed_at.format("%Y-%m-%d %H:%M")),
            Cell::new(&record.session_id),
            Cell::new(record.result.level),
            Cell::new(format!("{}%", record.result.score)),
            Cell::new(record.result.learning_style),
        ]);
    }

    println!("{table}");
    println!("{} result(s) for {user}", records.len());
    Ok(())
}
