//! # AI Visibility CLI (`aiv`)
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `aiv init` | Create the SQLite database and schema |
//! | `aiv report <query>` | Generate, store, and print a report |
//! | `aiv history list` | List stored reports, newest first |
//! | `aiv history show <id>` | Replay a stored report |
//! | `aiv history clear` | Delete all stored reports |
//! | `aiv serve` | Start the JSON HTTP API |
//! | `aiv completions <shell>` | Print a shell completion script |
//!
//! Logging goes to stderr and is controlled by `RUST_LOG` (default `warn`).

use ai_visibility::{config, history_cmd, migrate, report_cmd, server};
use ai_visibility_core::models::ReportKind;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// AI Visibility: AI-search visibility reports for domains and keywords.
#[derive(Parser)]
#[command(
    name = "aiv",
    about = "AI Visibility: AI-search visibility reports for domains and keywords",
    version,
    long_about = "Generates an SEO and generative-search visibility report for a domain or keyword \
    with Gemini, keeps a bounded local history of reports, and serves them over a JSON API."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/aiv.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema. Idempotent.
    Init,

    /// Generate a report for a domain or keyword.
    ///
    /// Calls Gemini once, records the report in history, and prints it.
    /// Requires the API key environment variable (default `GEMINI_API_KEY`).
    Report {
        /// Domain (e.g. `example.com`) or keyword to analyze.
        query: String,

        /// Report kind: `domain` or `keyword`.
        #[arg(long, default_value = "domain")]
        kind: ReportKind,

        /// Print the stored history item as JSON instead of rendering it.
        #[arg(long)]
        json: bool,
    },

    /// Inspect stored reports.
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },

    /// Start the JSON HTTP API on `[server].bind`.
    Serve,

    /// Print a shell completion script.
    Completions {
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List stored reports, newest first.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Replay a stored report without calling Gemini.
    Show {
        /// History item id, as printed by `aiv history list`.
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Delete every stored report.
    Clear,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    // Commands that don't require config
    if let Commands::Completions { shell } = cli.command {
        clap_complete::generate(shell, &mut Cli::command(), "aiv", &mut std::io::stdout());
        return Ok(());
    }

    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Report { query, kind, json } => {
            report_cmd::run_report(&cfg, &query, kind, json).await?;
        }
        Commands::History { action } => match action {
            HistoryAction::List { json } => history_cmd::run_history_list(&cfg, json).await?,
            HistoryAction::Show { id, json } => {
                history_cmd::run_history_show(&cfg, &id, json).await?
            }
            HistoryAction::Clear => history_cmd::run_history_clear(&cfg).await?,
        },
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
        Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
