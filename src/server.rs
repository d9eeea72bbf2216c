//! JSON HTTP API for a browser dashboard.
//!
//! Exposes one shared [`Session`] so a dashboard can submit reports, poll
//! the request state, and replay history. Each report is generated on a
//! spawned task, so a client that disconnects mid-request does not leave
//! the session stuck in Loading. The session lock is released while
//! Gemini is called; a second submission during that window gets
//! `409 busy`, and a result superseded by a replay gets `409 stale`.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/health` | Health check (returns version) |
//! | `GET`  | `/session` | Current request state, credential flag, displayed report |
//! | `POST` | `/session/credential` | Re-read the API key from the environment |
//! | `POST` | `/reports` | Generate a report: `{"query": "...", "kind": "DOMAIN"}` |
//! | `GET`  | `/history` | History summaries, newest first |
//! | `GET`  | `/history/{id}` | Replay a stored report |
//! | `DELETE` | `/history` | Clear the history log |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "query must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `credential_required` (401),
//! `not_found` (404), `busy` (409), `stale` (409), `generation_failed` (502),
//! `internal` (500).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ai_visibility_core::generator::{ReportGenerator, TextService};
use ai_visibility_core::models::{HistoryItem, ReportKind};
use ai_visibility_core::session::{Completion, RequestState, Session, SubmitError};

use crate::config::Config;
use crate::gemini::GeminiService;
use crate::report_cmd::open_session;
use crate::sqlite_store::SqliteKv;

type SharedGenerator = Arc<ReportGenerator<Arc<dyn TextService>>>;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    session: Arc<Mutex<Session<SqliteKv>>>,
    /// `None` until an API key is available.
    generator: Arc<RwLock<Option<SharedGenerator>>>,
}

impl AppState {
    /// Build state around an existing session. `service` of `None` means no
    /// credential is selected yet.
    pub fn new(
        config: Config,
        mut session: Session<SqliteKv>,
        service: Option<Arc<dyn TextService>>,
    ) -> Self {
        session.select_credential(service.is_some());
        let generator = service.map(|s| Arc::new(ReportGenerator::new(s, config.generator.settings())));
        Self {
            config: Arc::new(config),
            session: Arc::new(Mutex::new(session)),
            generator: Arc::new(RwLock::new(generator)),
        }
    }
}

/// Starts the HTTP server on `[server].bind`.
///
/// Runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let session = open_session(config).await?;
    let service = match GeminiService::from_config(&config.generator) {
        Ok(s) => Some(Arc::new(s) as Arc<dyn TextService>),
        Err(e) => {
            tracing::warn!(error = %e, "starting without a credential; POST /session/credential once it is set");
            None
        }
    };
    let state = AppState::new(config.clone(), session, service);

    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    println!("AI Visibility API listening on http://{}", config.server.bind);
    serve(listener, state).await
}

/// Serve the API on an already-bound listener.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> anyhow::Result<()> {
    tracing::info!(addr = %listener.local_addr()?, "serving AI Visibility API");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/session", get(handle_session))
        .route("/session/credential", post(handle_select_credential))
        .route("/reports", post(handle_report))
        .route("/history", get(handle_history).delete(handle_clear_history))
        .route("/history/{id}", get(handle_replay))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code.to_string(),
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<SubmitError> for AppError {
    fn from(e: SubmitError) -> Self {
        let (status, code) = match e {
            SubmitError::EmptyQuery => (StatusCode::BAD_REQUEST, "bad_request"),
            SubmitError::Busy => (StatusCode::CONFLICT, "busy"),
            SubmitError::CredentialRequired => (StatusCode::UNAUTHORIZED, "credential_required"),
        };
        AppError::new(status, code, e.to_string())
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /session ============

#[derive(Serialize)]
struct SessionView {
    #[serde(flatten)]
    state: RequestState,
    generation: u64,
    credential_selected: bool,
    history_len: usize,
    displayed: Option<HistoryItem>,
}

async fn handle_session(State(state): State<AppState>) -> Json<SessionView> {
    let session = state.session.lock().await;
    Json(SessionView {
        state: session.state().clone(),
        generation: session.generation(),
        credential_selected: session.credential_selected(),
        history_len: session.history().len(),
        displayed: session.displayed().cloned(),
    })
}

#[derive(Serialize)]
struct CredentialResponse {
    credential_selected: bool,
}

/// Re-read the API key; the shell calls this after a credential rejection.
async fn handle_select_credential(
    State(state): State<AppState>,
) -> Result<Json<CredentialResponse>, AppError> {
    let service = GeminiService::from_config(&state.config.generator);
    let mut session = state.session.lock().await;
    match service {
        Ok(service) => {
            let service: Arc<dyn TextService> = Arc::new(service);
            *state.generator.write().await = Some(Arc::new(ReportGenerator::new(
                service,
                state.config.generator.settings(),
            )));
            session.select_credential(true);
            Ok(Json(CredentialResponse {
                credential_selected: true,
            }))
        }
        Err(e) => {
            session.select_credential(false);
            Err(AppError::new(
                StatusCode::UNAUTHORIZED,
                "credential_required",
                e.to_string(),
            ))
        }
    }
}

// ============ POST /reports ============

#[derive(Deserialize)]
struct ReportRequestBody {
    query: String,
    kind: String,
}

async fn handle_report(
    State(state): State<AppState>,
    Json(body): Json<ReportRequestBody>,
) -> Result<Json<HistoryItem>, AppError> {
    let kind: ReportKind = body
        .kind
        .parse()
        .map_err(|e: ai_visibility_core::generator::GenerateError| {
            AppError::new(StatusCode::BAD_REQUEST, "bad_request", e.to_string())
        })?;

    let generator = state
        .generator
        .read()
        .await
        .clone()
        .ok_or(SubmitError::CredentialRequired)?;

    let ticket = state.session.lock().await.submit(&body.query, kind)?;

    // Runs to completion even if the client disconnects and this handler
    // is dropped; the session lock is released while the service call is
    // in flight.
    let session = state.session.clone();
    let task = tokio::spawn(async move {
        let outcome = generator.generate(&ticket.query, ticket.kind).await;
        let mut session = session.lock().await;
        let completion = session.complete(&ticket, outcome).await;
        (completion, session.credential_selected())
    });
    let (completion, credential_selected) = task.await.map_err(|e| {
        tracing::error!(error = %e, "report task failed");
        AppError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal",
            "report generation task failed",
        )
    })?;

    match completion {
        Completion::Recorded(item) => Ok(Json(item)),
        Completion::Failed(message) if !credential_selected => Err(AppError::new(
            StatusCode::UNAUTHORIZED,
            "credential_required",
            message,
        )),
        Completion::Failed(message) => Err(AppError::new(
            StatusCode::BAD_GATEWAY,
            "generation_failed",
            message,
        )),
        Completion::Stale => Err(AppError::new(
            StatusCode::CONFLICT,
            "stale",
            "report request was superseded by a newer one",
        )),
    }
}

// ============ /history ============

#[derive(Serialize)]
struct HistorySummary {
    id: String,
    query: String,
    #[serde(rename = "type")]
    kind: ReportKind,
    timestamp: i64,
}

async fn handle_history(State(state): State<AppState>) -> Json<Vec<HistorySummary>> {
    let session = state.session.lock().await;
    let items = session
        .history()
        .items()
        .iter()
        .map(|item| HistorySummary {
            id: item.id.clone(),
            query: item.query.clone(),
            kind: item.kind,
            timestamp: item.timestamp,
        })
        .collect();
    Json(items)
}

async fn handle_replay(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HistoryItem>, AppError> {
    let mut session = state.session.lock().await;
    session
        .replay(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::new(StatusCode::NOT_FOUND, "not_found", format!("history item not found: {}", id)))
}

async fn handle_clear_history(State(state): State<AppState>) -> StatusCode {
    state.session.lock().await.clear_history().await;
    StatusCode::NO_CONTENT
}
