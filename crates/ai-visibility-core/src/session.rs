//! Request session: the state machine around one report request.
//!
//! ```text
//!            submit               generator resolves
//!   Idle ───────────▶ Loading ─────────────────────▶ Success
//!    ▲                   │                              │
//!    │                   └──── generator rejects ─▶ Failure
//!    └──────── new submit from Success / Failure ───────┘
//! ```
//!
//! A [`Session`] owns the [`HistoryStore`] and the credential-selected
//! flag. Each submission gets a [`Ticket`] tagged with a generation number;
//! [`Session::complete`] discards a ticket that is no longer current, so a
//! late result cannot overwrite a newer submission or a replayed report.

use serde::Serialize;
use thiserror::Error;

use crate::generator::{GenerateError, ReportGenerator, TextService};
use crate::history::HistoryStore;
use crate::models::{AnalysisResult, HistoryItem, ReportKind};
use crate::store::KvStore;

/// Message shown when the service rejected the credential.
pub const CREDENTIAL_RESELECT_MESSAGE: &str =
    "API key might be invalid or needs to be re-selected. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum RequestState {
    Idle,
    Loading { query: String, kind: ReportKind },
    Success { item_id: String },
    Failure { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("query must not be empty")]
    EmptyQuery,
    #[error("a report is already being generated")]
    Busy,
    #[error("no API key selected; select a credential and try again")]
    CredentialRequired,
}

/// Handle of an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub generation: u64,
    pub query: String,
    pub kind: ReportKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The report was recorded and is now displayed.
    Recorded(HistoryItem),
    /// Generation failed; the message is displayed.
    Failed(String),
    /// The ticket was superseded; the outcome was dropped.
    Stale,
}

pub struct Session<K> {
    history: HistoryStore<K>,
    state: RequestState,
    generation: u64,
    credential_selected: bool,
}

impl<K: KvStore> Session<K> {
    pub fn new(history: HistoryStore<K>, credential_selected: bool) -> Self {
        Self {
            history,
            state: RequestState::Idle,
            generation: 0,
            credential_selected,
        }
    }

    pub fn state(&self) -> &RequestState {
        &self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, RequestState::Loading { .. })
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            RequestState::Failure { message } => Some(message),
            _ => None,
        }
    }

    /// The report currently on display, if any.
    pub fn displayed(&self) -> Option<&HistoryItem> {
        match &self.state {
            RequestState::Success { item_id } => self.history.find(item_id),
            _ => None,
        }
    }

    pub fn history(&self) -> &HistoryStore<K> {
        &self.history
    }

    pub fn credential_selected(&self) -> bool {
        self.credential_selected
    }

    pub fn select_credential(&mut self, selected: bool) {
        self.credential_selected = selected;
    }

    /// Accept a new submission and enter Loading.
    pub fn submit(&mut self, query: &str, kind: ReportKind) -> Result<Ticket, SubmitError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SubmitError::EmptyQuery);
        }
        if self.is_loading() {
            return Err(SubmitError::Busy);
        }
        if !self.credential_selected {
            return Err(SubmitError::CredentialRequired);
        }

        self.generation += 1;
        self.state = RequestState::Loading {
            query: query.to_string(),
            kind,
        };
        Ok(Ticket {
            generation: self.generation,
            query: query.to_string(),
            kind,
        })
    }

    /// Apply the generator's outcome for `ticket`.
    pub async fn complete(
        &mut self,
        ticket: &Ticket,
        outcome: Result<AnalysisResult, GenerateError>,
    ) -> Completion {
        if ticket.generation != self.generation || !self.is_loading() {
            tracing::debug!(
                ticket = ticket.generation,
                current = self.generation,
                "dropping stale report outcome"
            );
            return Completion::Stale;
        }

        match outcome {
            Ok(report) => {
                let item = self.history.record(report, &ticket.query, ticket.kind).await;
                self.state = RequestState::Success {
                    item_id: item.id.clone(),
                };
                Completion::Recorded(item)
            }
            Err(e) => {
                let message = if e.is_credential_rejected() {
                    self.credential_selected = false;
                    CREDENTIAL_RESELECT_MESSAGE.to_string()
                } else {
                    e.to_string()
                };
                tracing::warn!(query = %ticket.query, error = %e, "report generation failed");
                self.state = RequestState::Failure {
                    message: message.clone(),
                };
                Completion::Failed(message)
            }
        }
    }

    /// Submit, generate, and complete in one step.
    pub async fn run<S: TextService>(
        &mut self,
        generator: &ReportGenerator<S>,
        query: &str,
        kind: ReportKind,
    ) -> Result<Completion, SubmitError> {
        let ticket = self.submit(query, kind)?;
        let outcome = generator.generate(&ticket.query, ticket.kind).await;
        Ok(self.complete(&ticket, outcome).await)
    }

    /// Display a stored report without contacting the service.
    ///
    /// Any in-flight ticket becomes stale.
    pub fn replay(&mut self, id: &str) -> Option<&HistoryItem> {
        self.history.find(id)?;
        self.generation += 1;
        self.state = RequestState::Success {
            item_id: id.to_string(),
        };
        self.history.find(id)
    }

    /// Clear the history log and return to Idle.
    pub async fn clear_history(&mut self) {
        self.history.clear().await;
        self.generation += 1;
        self.state = RequestState::Idle;
    }
}
