//! The `adaptest score` command.

use std::path::PathBuf;

use anyhow::Result;

use adaptest_core::scoring;

use super::{load_session, load_setup, print_result};

pub fn execute(
    session_path: PathBuf,
    bank: Option<PathBuf>,
    json: bool,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let (_, bank) = load_setup(config_path.as_deref(), bank)?;
    let session = load_session(&session_path)?;
    let result = scoring::score(session.answers(), &bank)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "Session {} ({}, {} answers)",
            session.session_id(),
            session.user_id(),
            session.answers().len()
        );
        print_result(&result);
    }

    Ok(())
}
