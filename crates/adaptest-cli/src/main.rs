//! adaptest CLI — run and inspect adaptive diagnostic evaluations.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "adaptest", version, about = "Adaptive diagnostic evaluation engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take an adaptive evaluation on the terminal
    Run {
        /// Learner identifier
        #[arg(long)]
        user: String,

        /// Question bank TOML (overrides config)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Results directory (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the diagnostic tree as JSON to this file
        #[arg(long)]
        tree: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a question bank TOML file
    Validate {
        /// Path to the bank file
        #[arg(long)]
        bank: PathBuf,
    },

    /// Score a saved session
    Score {
        /// Session JSON written by `adaptest run`
        #[arg(long)]
        session: PathBuf,

        /// Question bank TOML (overrides config)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Build the diagnostic tree for a saved session
    Tree {
        /// Session JSON written by `adaptest run`
        #[arg(long)]
        session: PathBuf,

        /// Question bank TOML (overrides config)
        #[arg(long)]
        bank: Option<PathBuf>,

        /// Write the tree here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show saved results for a learner
    History {
        /// Learner identifier
        #[arg(long)]
        user: String,

        /// Results directory (overrides config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and question bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("adaptest=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            user,
            bank,
            output,
            tree,
            config,
        } => {
            let stdin = std::io::stdin();
            commands::run::execute(user, bank, output, tree, config, stdin.lock()).await
        }
        Commands::Validate { bank } => commands::validate::execute(bank),
        Commands::Score {
            session,
            bank,
            json,
            config,
        } => commands::score::execute(session, bank, json, config),
        Commands::Tree {
            session,
            bank,
            output,
            config,
        } => commands::tree::execute(session, bank, output, config).await,
        Commands::History {
            user,
            output,
            config,
        } => commands::history::execute(user, output, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
