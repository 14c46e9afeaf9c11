//! The `adaptest validate` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_core::bank::{parse_bank, validate_bank};
use adaptest_core::Difficulty;

pub fn execute(bank_path: PathBuf) -> Result<()> {
    let bank = parse_bank(&bank_path)?;
    let counts = bank.tier_counts();
    let tiers: Vec<String> = Difficulty::ALL
        .iter()
        .map(|tier| format!("{} {tier}", counts.get(tier).copied().unwrap_or(0)))
        .collect();

    println!(
        "Question bank: {} ({} questions: {})",
        bank_path.display(),
        bank.len(),
        tiers.join(", ")
    );

    let warnings = validate_bank(&bank);
    for w in &warnings {
        let prefix = w
            .question_id
            .map(|id| format!("  [{id}]"))
            .unwrap_or_else(|| "  ".to_string());
        println!("{prefix} WARNING: {}", w.message);
    }

    if warnings.is_empty() {
        println!("Bank is valid.");
    } else {
        println!("\n{} warning(s) found.", warnings.len());
    }

    Ok(())
}
