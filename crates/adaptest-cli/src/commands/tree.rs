//! The `adaptest tree` command.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use adaptest_core::TreeBuilder;
use adaptest_providers::create_provider;

use super::{load_session, load_setup};

pub async fn execute(
    session_path: PathBuf,
    bank: Option<PathBuf>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (config, bank) = load_setup(config_path.as_deref(), bank)?;
    let session = load_session(&session_path)?;
    let review = session.review(&bank)?;

    let provider = create_provider(&config, bank.clone())?;
    let builder = TreeBuilder::new(provider)
        .with_timeout(Duration::from_secs(config.provider_timeout_secs));
    let tree = builder.build(&review).await;

    let json = serde_json::to_string_pretty(&tree).context("failed to serialize tree")?;
    match output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("failed to write tree to {}", path.display()))?;
            eprintln!("Diagnostic tree written to: {}", path.display());
        }
        None => println!("{json}"),
    }

    let (width, height) = tree.canvas_size();
    eprintln!(
        "{} nodes, {} taken and {} alternative connections, {:?} alternatives, canvas {width}x{height}",
        tree.nodes.len(),
        tree.taken_connections(),
        tree.alternative_connections(),
        tree.source
    );

    Ok(())
}
