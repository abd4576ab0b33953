//! API routes for aerotutord
//!
//! POST /v1/ask             question + focus → TutorResponse
//! POST /v1/classify        question → Classification
//! POST /v1/corpus/reindex  rebuild the corpus from configured paths
//! GET  /v1/health          daemon status

use crate::state::AppState;
use aero_common::{Classification, IngestReport, SystemFocus, TutorResponse};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

type AppStateArc = Arc<AppState>;

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    pub system_focus: SystemFocus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyRequest {
    pub question: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub documents: usize,
    pub classifier_mode: String,
    pub config: String,
    pub audit_enabled: bool,
}

// ============================================================================
// Ask / Classify
// ============================================================================

pub fn ask_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/v1/ask", post(ask))
        .route("/v1/classify", post(classify))
}

async fn ask(
    State(state): State<AppStateArc>,
    Json(req): Json<AskRequest>,
) -> Result<Json<TutorResponse>, (StatusCode, String)> {
    let request_id = Uuid::new_v4();
    let mediator = Arc::clone(&state.mediator);
    let focus = req.system_focus;

    let response = tokio::task::spawn_blocking(move || mediator.handle_question(&req.question, focus))
        .await
        .map_err(|e| {
            error!(%request_id, "  Ask handler failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "request failed".to_string())
        })?;

    info!(
        %request_id,
        focus = focus.as_str(),
        category = response.classification.category.as_str(),
        redirected = response.was_redirected,
        "  Answered"
    );
    Ok(Json(response))
}

async fn classify(
    State(state): State<AppStateArc>,
    Json(req): Json<ClassifyRequest>,
) -> Json<Classification> {
    Json(state.mediator.classifier().classify(&req.question))
}

// ============================================================================
// Corpus
// ============================================================================

pub fn corpus_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/corpus/reindex", post(reindex))
}

async fn reindex(
    State(state): State<AppStateArc>,
) -> Result<Json<IngestReport>, (StatusCode, String)> {
    let _guard = state.reindex_lock.lock().await;

    let corpus = Arc::clone(state.mediator.corpus());
    let paths = state.loaded.config.corpus.paths.clone();
    let snippet_chars = state.loaded.config.corpus.effective_snippet_chars();

    let report = tokio::task::spawn_blocking(move || corpus.rebuild(&paths, snippet_chars))
        .await
        .map_err(|e| {
            error!("  Reindex failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })?;

    info!("  Corpus reindexed: {} documents", report.indexed());
    Ok(Json(report))
}

// ============================================================================
// Health
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/v1/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    let mode = state.mediator.classifier().mode();
    Json(HealthResponse {
        status: if state.loaded.is_fail_safe() {
            "degraded".to_string()
        } else {
            "healthy".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.uptime_secs(),
        documents: state.mediator.corpus().len(),
        classifier_mode: mode.as_str().to_string(),
        config: state.loaded.health.as_str().to_string(),
        audit_enabled: state.mediator.compliance_enabled(),
    })
}
