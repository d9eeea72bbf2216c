//! `aiv report`: generate a report, record it, and print it.

use anyhow::{bail, Result};

use ai_visibility_core::generator::ReportGenerator;
use ai_visibility_core::history::HistoryStore;
use ai_visibility_core::models::{HistoryItem, ReportKind};
use ai_visibility_core::session::{Completion, Session, SubmitError};

use crate::config::Config;
use crate::gemini::{api_key_from_env, GeminiService, FALLBACK_API_KEY_ENV};
use crate::render;
use crate::sqlite_store::SqliteKv;

/// Open the configured history and wrap it in a session.
///
/// The credential flag reflects whether an API key is present in the environment.
pub async fn open_session(config: &Config) -> Result<Session<SqliteKv>> {
    let kv = SqliteKv::open(config).await?;
    let history = HistoryStore::load(
        kv,
        config.history.storage_key.clone(),
        config.history.max_items,
    )
    .await;
    let has_key = api_key_from_env(&config.generator.api_key_env).is_some();
    Ok(Session::new(history, has_key))
}

/// Core report function returning the recorded item (used by CLI and tests).
pub async fn generate_report(config: &Config, query: &str, kind: ReportKind) -> Result<HistoryItem> {
    let mut session = open_session(config).await?;

    if !session.credential_selected() {
        bail!(
            "{}: set {} (or {}) to a Gemini API key",
            SubmitError::CredentialRequired,
            config.generator.api_key_env,
            FALLBACK_API_KEY_ENV
        );
    }

    let service = GeminiService::from_config(&config.generator)?;
    let generator = ReportGenerator::new(service, config.generator.settings());

    match session.run(&generator, query, kind).await? {
        Completion::Recorded(item) => Ok(item),
        Completion::Failed(message) => bail!(message),
        Completion::Stale => bail!("report request was superseded"),
    }
}

/// CLI entry point for `aiv report`.
pub async fn run_report(config: &Config, query: &str, kind: ReportKind, json: bool) -> Result<()> {
    let item = generate_report(config, query, kind).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&item)?);
    } else {
        print!("{}", render::render_report(&item.report));
        println!();
        println!("Saved to history as {}", item.id);
    }

    Ok(())
}
