//! # AI Visibility Core
//!
//! Shared, I/O-free logic for AI Visibility: report models, magnitude
//! parsing, chart math, prompt and schema construction, the report
//! generator, the key-value store abstraction, the bounded history log,
//! and the request session state machine.
//!
//! This crate contains no tokio, sqlx, HTTP client, or filesystem access.
//! Transports ([`generator::TextService`]) and persistence
//! ([`store::KvStore`]) are traits implemented by the application crate.

pub mod chart;
pub mod generator;
pub mod history;
pub mod models;
pub mod schema;
pub mod session;
pub mod store;
pub mod volume;
