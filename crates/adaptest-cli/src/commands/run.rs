//! The `adaptest run` command.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use adaptest_core::repository::JsonResultStore;
use adaptest_core::{EvaluationEngine, EvaluationSession, TreeBuilder, UserAnswer};
use adaptest_providers::create_provider;

use super::{load_setup, print_result};

pub async fn execute<R: BufRead>(
    user: String,
    bank: Option<PathBuf>,
    output: Option<PathBuf>,
    tree_path: Option<PathBuf>,
    config_path: Option<PathBuf>,
    input: R,
) -> Result<()> {
    let (config, bank) = load_setup(config_path.as_deref(), bank)?;
    let results_dir = output.unwrap_or_else(|| config.results_dir.clone());

    let provider = create_provider(&config, bank.clone())?;
    let trees = TreeBuilder::new(provider)
        .with_timeout(Duration::from_secs(config.provider_timeout_secs));
    let store = Arc::new(JsonResultStore::new(&results_dir));
    let engine = EvaluationEngine::new(bank, trees, store);

    let session = engine.start(&user)?;
    eprintln!(
        "adaptest v{}: session {} for {}",
        env!("CARGO_PKG_VERSION"),
        session.session_id(),
        session.user_id()
    );

    quiz(&engine, input, &mut std::io::stdout().lock())?;

    let session = engine
        .current_session()
        .context("evaluation session was dropped")?;
    let result = engine.calculate_results()?;
    println!("\nEvaluation complete: {} questions answered", session.answers().len());
    print_result(&result);

    let record = engine.save_results(&result).await?;
    let session_path = results_dir
        .join("sessions")
        .join(format!("{}.json", record.session_id));
    save_session(&session, &session_path)?;
    eprintln!("Results saved to: {}", results_dir.display());
    eprintln!("Session saved to: {}", session_path.display());

    if let Some(path) = tree_path {
        let tree = engine.build_tree().await?;
        let json = serde_json::to_string_pretty(&tree).context("failed to serialize tree")?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write tree to {}", path.display()))?;
        eprintln!(
            "Diagnostic tree: {} ({} nodes, {:?} alternatives)",
            path.display(),
            tree.nodes.len(),
            tree.source
        );
    }

    Ok(())
}

fn save_session(session: &EvaluationSession, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(session).context("failed to serialize session")?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, json)
        .with_context(|| format!("failed to write session to {}", path.display()))?;
    Ok(())
}

/// Ask questions until the session completes.
fn quiz<R: BufRead, W: Write>(engine: &EvaluationEngine, mut input: R, out: &mut W) -> Result<()> {
    let mut next = engine.first_question()?;
    let mut number = 0;

    while let Some(question) = next {
        number += 1;
        writeln!(
            out,
            "\nQuestion {number} [{} / {}]",
            question.difficulty, question.topic
        )?;
        writeln!(out, "{}", question.text)?;
        for (i, option) in question.options.iter().enumerate() {
            writeln!(out, "  {}) {option}", i + 1)?;
        }

        let started = Instant::now();
        let selected = read_choice(&mut input, out, question.options.len())?;
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

        let outcome = engine.submit(UserAnswer::new(&question, selected, elapsed_ms))?;
        next = outcome.next_question;
    }

    Ok(())
}

/// Read a 1-based option number, re-prompting on bad input.
fn read_choice<R: BufRead, W: Write>(input: &mut R, out: &mut W, options: usize) -> Result<usize> {
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            anyhow::bail!("input ended before the evaluation finished");
        }
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=options).contains(&n) => return Ok(n - 1),
            _ => writeln!(out, "Please enter a number between 1 and {options}")?,
        }
    }
}
