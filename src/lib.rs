//! # AI Visibility
//!
//! Generate an "AI visibility" SEO report for a domain or keyword with
//! Gemini, keep a bounded local history of past reports, and replay them
//! without calling the service again.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────────┐   ┌──────────────┐
//! │ CLI/HTTP │──▶│    Session     │──▶│ ReportGen +  │──▶ Gemini
//! │  (aiv)   │   │ (state machine)│   │ GeminiService│
//! └──────────┘   └───────┬────────┘   └──────────────┘
//!                        ▼
//!                ┌──────────────┐   ┌──────────┐
//!                │ HistoryStore │──▶│  SQLite  │
//!                │  (bounded)   │   │  kv row  │
//!                └──────────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! export GEMINI_API_KEY=...
//! aiv init
//! aiv report example.com --kind domain
//! aiv report "ai seo tools" --kind keyword
//! aiv history list
//! aiv history show <id>
//! aiv serve
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | SQLite connection pool with WAL mode |
//! | [`migrate`] | Schema creation (idempotent) |
//! | [`sqlite_store`] | SQLite-backed `KvStore` |
//! | [`gemini`] | Gemini `generateContent` transport |
//! | [`render`] | Terminal rendering of reports and history |
//! | [`report_cmd`] | `aiv report` |
//! | [`history_cmd`] | `aiv history list/show/clear` |
//! | [`server`] | JSON HTTP API (Axum) with CORS |
//!
//! Models, parsing, the generator, the history log, and the session live
//! in [`ai_visibility_core`], re-exported as [`core`].

pub mod config;
pub mod db;
pub mod gemini;
pub mod history_cmd;
pub mod migrate;
pub mod render;
pub mod report_cmd;
pub mod server;
pub mod sqlite_store;

pub use ai_visibility_core as core;
