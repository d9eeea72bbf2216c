//! Gemini `generateContent` transport.
//!
//! [`GeminiService`] implements [`TextService`] against the Gemini REST
//! API: one `POST /v1beta/models/{model}:generateContent` per report, with
//! the prompt, the response schema, `responseMimeType: application/json`,
//! and a thinking budget. The API key is read from the environment variable
//! named by `generator.api_key_env` (falling back to `API_KEY`) and sent as
//! the `x-goog-api-key` header.
//!
//! # Errors
//!
//! Every failure maps to [`ServiceError`]:
//! - non-2xx → status plus the provider's `error.message`
//! - transport failure → no status, the client error text
//!
//! There is no retry. A timeout applies only when `generator.timeout_secs`
//! is configured.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

use ai_visibility_core::generator::{ServiceError, TextService};
use ai_visibility_core::schema::ReportRequest;

use crate::config::GeneratorConfig;

/// Secondary environment variable checked for the API key.
pub const FALLBACK_API_KEY_ENV: &str = "API_KEY";

/// Read the API key from `env_var`, then [`FALLBACK_API_KEY_ENV`].
pub fn api_key_from_env(env_var: &str) -> Option<String> {
    [env_var, FALLBACK_API_KEY_ENV]
        .iter()
        .filter_map(|name| std::env::var(name).ok())
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

pub struct GeminiService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiService {
    /// Build a service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if neither the configured env var nor `API_KEY`
    /// holds a key, or the HTTP client cannot be built.
    pub fn from_config(config: &GeneratorConfig) -> Result<Self> {
        let api_key = api_key_from_env(&config.api_key_env).ok_or_else(|| {
            anyhow!(
                "{} environment variable not set (or {})",
                config.api_key_env,
                FALLBACK_API_KEY_ENV
            )
        })?;
        Self::new(config, api_key)
    }

    pub fn new(config: &GeneratorConfig, api_key: impl Into<String>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }
}

#[async_trait]
impl TextService for GeminiService {
    async fn complete(&self, request: &ReportRequest) -> Result<String, ServiceError> {
        let url = self.endpoint(&request.model);
        tracing::debug!(%url, "calling Gemini generateContent");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body(request))
            .send()
            .await
            .map_err(|e| ServiceError::new(None, e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ServiceError::new(Some(status.as_u16()), e.to_string()))?;

        if !status.is_success() {
            return Err(ServiceError::new(
                Some(status.as_u16()),
                error_message(&body),
            ));
        }

        let json: Value = serde_json::from_str(&body).map_err(|e| {
            ServiceError::new(
                Some(status.as_u16()),
                format!("invalid generateContent envelope: {}", e),
            )
        })?;
        Ok(response_text(&json))
    }
}

/// JSON body of a `generateContent` call.
pub fn request_body(request: &ReportRequest) -> Value {
    json!({
        "contents": [
            { "parts": [ { "text": request.prompt } ] }
        ],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": request.schema,
            "thinkingConfig": { "thinkingBudget": request.thinking_budget },
        },
    })
}

/// Concatenated text of the first candidate, skipping thought parts.
///
/// Missing candidates or parts yield an empty string.
pub fn response_text(json: &Value) -> String {
    json.get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.pointer("/content/parts"))
        .and_then(Value::as_array)
        .map(|parts| {
            parts
                .iter()
                .filter(|p| !p.get("thought").and_then(Value::as_bool).unwrap_or(false))
                .filter_map(|p| p.get("text").and_then(Value::as_str))
                .collect::<String>()
        })
        .unwrap_or_default()
}

/// Provider error message from an error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
