//! Report generation over a pluggable text service.
//!
//! [`ReportGenerator::generate`] builds the prompt and schema for a query,
//! makes exactly one [`TextService::complete`] call, and decodes the
//! returned text into an [`AnalysisResult`]. There is no retry; callers
//! re-invoke on failure.
//!
//! # Validation
//!
//! | Response | Result |
//! |----------|--------|
//! | empty or whitespace | [`GenerateError::EmptyResponse`] |
//! | not JSON | [`GenerateError::MalformedResponse`] |
//! | JSON missing a required field or with a wrong type | [`GenerateError::SchemaMismatch`] |
//! | JSON matching the kind's shape | `Ok(report)` |

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{AnalysisResult, DomainReport, KeywordReport, ReportKind};
use crate::schema::{build_request, GeneratorSettings, ReportRequest};

/// Provider message signalling a rejected or unselected API credential.
pub const CREDENTIAL_REJECTED_SIGNATURE: &str = "Requested entity was not found";

/// Failure of the external call (network, auth, quota, provider error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Failed to generate report. Please try again.")]
pub struct ServiceError {
    /// HTTP status, when the service answered at all.
    pub status: Option<u16>,
    /// Provider or transport detail, kept for logs.
    pub detail: String,
}

impl ServiceError {
    pub fn new(status: Option<u16>, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    /// Whether the service refused the configured credential.
    pub fn is_credential_rejected(&self) -> bool {
        self.detail.contains(CREDENTIAL_REJECTED_SIGNATURE)
            || matches!(self.status, Some(401) | Some(403))
    }
}

#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("invalid report type: '{0}' (expected DOMAIN or KEYWORD)")]
    InvalidReportKind(String),

    #[error("the generation service returned an empty response")]
    EmptyResponse,

    #[error("the generation service returned malformed JSON: {0}")]
    MalformedResponse(#[source] serde_json::Error),

    #[error("the generated {kind} report does not match its schema: {source}")]
    SchemaMismatch {
        kind: ReportKind,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl GenerateError {
    pub fn is_credential_rejected(&self) -> bool {
        matches!(self, GenerateError::Service(e) if e.is_credential_rejected())
    }
}

/// A generative text endpoint that answers a [`ReportRequest`] with one text payload.
#[async_trait]
pub trait TextService: Send + Sync {
    async fn complete(&self, request: &ReportRequest) -> Result<String, ServiceError>;
}

#[async_trait]
impl<T: TextService + ?Sized> TextService for std::sync::Arc<T> {
    async fn complete(&self, request: &ReportRequest) -> Result<String, ServiceError> {
        (**self).complete(request).await
    }
}

pub struct ReportGenerator<S> {
    service: S,
    settings: GeneratorSettings,
}

impl<S: TextService> ReportGenerator<S> {
    pub fn new(service: S, settings: GeneratorSettings) -> Self {
        Self { service, settings }
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub async fn generate(
        &self,
        query: &str,
        kind: ReportKind,
    ) -> Result<AnalysisResult, GenerateError> {
        let request = build_request(query, kind, &self.settings);
        tracing::debug!(model = %request.model, %kind, query, "requesting report");

        let text = self.service.complete(&request).await.map_err(|e| {
            tracing::error!(status = ?e.status, detail = %e.detail, "generation service call failed");
            GenerateError::Service(e)
        })?;

        parse_report(&text, kind)
    }
}

/// Decode a service payload into a report of `kind`.
pub fn parse_report(text: &str, kind: ReportKind) -> Result<AnalysisResult, GenerateError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(GenerateError::EmptyResponse);
    }

    let value: serde_json::Value =
        serde_json::from_str(trimmed).map_err(GenerateError::MalformedResponse)?;

    let mismatch = |source| GenerateError::SchemaMismatch { kind, source };
    match kind {
        ReportKind::Domain => serde_json::from_value::<DomainReport>(value)
            .map(AnalysisResult::Domain)
            .map_err(mismatch),
        ReportKind::Keyword => serde_json::from_value::<KeywordReport>(value)
            .map(AnalysisResult::Keyword)
            .map_err(mismatch),
    }
}
