//! TOML configuration parsing and validation.
//!
//! Only `[db]` is required; every other section falls back to defaults.
//! See `config/aiv.example.toml` for a complete file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use ai_visibility_core::history::{DEFAULT_MAX_ITEMS, DEFAULT_STORAGE_KEY};
use ai_visibility_core::schema::{GeneratorSettings, DEFAULT_MODEL, DEFAULT_THINKING_BUDGET};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HistoryConfig {
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_items: DEFAULT_MAX_ITEMS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

fn default_max_items() -> usize {
    DEFAULT_MAX_ITEMS
}
fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneratorConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_thinking_budget")]
    pub thinking_budget: u32,
    /// Environment variable holding the Gemini API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Request timeout. Unset means the HTTP client's default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            thinking_budget: default_thinking_budget(),
            api_key_env: default_api_key_env(),
            base_url: default_base_url(),
            timeout_secs: None,
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_thinking_budget() -> u32 {
    DEFAULT_THINKING_BUDGET
}
fn default_api_key_env() -> String {
    "GEMINI_API_KEY".to_string()
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

impl GeneratorConfig {
    pub fn settings(&self) -> GeneratorSettings {
        GeneratorSettings {
            model: self.model.clone(),
            thinking_budget: self.thinking_budget,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_config(&content)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;

    if config.history.max_items == 0 {
        anyhow::bail!("history.max_items must be >= 1");
    }
    if config.history.storage_key.trim().is_empty() {
        anyhow::bail!("history.storage_key must not be empty");
    }
    if config.generator.model.trim().is_empty() {
        anyhow::bail!("generator.model must not be empty");
    }
    if config.generator.api_key_env.trim().is_empty() {
        anyhow::bail!("generator.api_key_env must not be empty");
    }
    if config.generator.timeout_secs == Some(0) {
        anyhow::bail!("generator.timeout_secs must be > 0 when set");
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let cfg = parse_config("[db]\npath = \"./data/aiv.sqlite\"\n").unwrap();
        assert_eq!(cfg.history.max_items, DEFAULT_MAX_ITEMS);
        assert_eq!(cfg.history.storage_key, "aiVisibilityHistory");
        assert_eq!(cfg.generator.model, DEFAULT_MODEL);
        assert_eq!(cfg.generator.thinking_budget, 2048);
        assert_eq!(cfg.generator.api_key_env, "GEMINI_API_KEY");
        assert_eq!(cfg.generator.timeout_secs, None);
        assert_eq!(cfg.server.bind, "127.0.0.1:7341");
    }

    #[test]
    fn test_overrides() {
        let cfg = parse_config(
            r#"
[db]
path = "/tmp/aiv.sqlite"

[history]
max_items = 3

[generator]
model = "gemini-2.5-pro"
thinking_budget = 512
timeout_secs = 30
"#,
        )
        .unwrap();
        assert_eq!(cfg.history.max_items, 3);
        let settings = cfg.generator.settings();
        assert_eq!(settings.model, "gemini-2.5-pro");
        assert_eq!(settings.thinking_budget, 512);
        assert_eq!(cfg.generator.timeout_secs, Some(30));
    }

    #[test]
    fn test_validation_errors() {
        let err = parse_config("[db]\npath = \"x\"\n[history]\nmax_items = 0\n").unwrap_err();
        assert!(err.to_string().contains("history.max_items"));

        let err = parse_config("[db]\npath = \"x\"\n[generator]\nmodel = \" \"\n").unwrap_err();
        assert!(err.to_string().contains("generator.model"));

        assert!(parse_config("[history]\nmax_items = 3\n").is_err());
    }
}
