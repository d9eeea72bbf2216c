//! `aiv history`: list, replay, and clear stored reports.
//!
//! Replaying reads the stored report back without contacting Gemini.

use anyhow::{bail, Result};

use ai_visibility_core::history::replay;

use crate::config::Config;
use crate::render;
use crate::report_cmd::open_session;

pub async fn run_history_list(config: &Config, json: bool) -> Result<()> {
    let session = open_session(config).await?;
    let items = session.history().items();

    if json {
        println!("{}", serde_json::to_string_pretty(items)?);
    } else {
        print!("{}", render::render_history(items));
    }
    Ok(())
}

pub async fn run_history_show(config: &Config, id: &str, json: bool) -> Result<()> {
    let mut session = open_session(config).await?;
    let item = match session.replay(id) {
        Some(item) => item,
        None => bail!("history item not found: {}", id),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(item)?);
    } else {
        let view = replay(item);
        println!("{}: {}", view.kind.label(), view.query);
        println!();
        print!("{}", render::render_report(view.report));
    }
    Ok(())
}

pub async fn run_history_clear(config: &Config) -> Result<()> {
    let mut session = open_session(config).await?;
    let count = session.history().len();
    session.clear_history().await;
    println!("Cleared {} history item(s).", count);
    Ok(())
}
