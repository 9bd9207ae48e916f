//! HTTP handler for the Regflow Validation Agent
//!
//! Thin axum surface over the engines and the audit ledger. Request and
//! response bodies are the contract types themselves. Validation endpoints
//! never write to the ledger; callers record verdicts via `POST /audit/events`.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use regflow_audit::{AppendRequest, AuditLedger, ChainVerification, LedgerError, StoredEvent};
use serde::Serialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::contracts::*;
use crate::engine::{IntakeValidationEngine, PacketValidationEngine, StatementValidationEngine};
use crate::telemetry::ValidationMetricsRegistry;
use crate::{AGENT_ID, AGENT_VERSION};

/// Application state
pub struct AppState {
    pub intake: IntakeValidationEngine,
    pub statements: StatementValidationEngine,
    pub packets: PacketValidationEngine,
    pub ledger: Arc<AuditLedger>,
    pub metrics: ValidationMetricsRegistry,
}

impl AppState {
    /// Create state around an opened ledger
    pub fn new(ledger: Arc<AuditLedger>) -> crate::telemetry::Result<Self> {
        Ok(Self {
            intake: IntakeValidationEngine::new(),
            statements: StatementValidationEngine::new(),
            packets: PacketValidationEngine::new(),
            ledger,
            metrics: ValidationMetricsRegistry::new()?,
        })
    }
}

/// Create the router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/intake/validate", post(validate_intake))
        .route("/evidence/statements/validate", post(validate_statements))
        .route("/workflow/packets/validate", post(validate_packet))
        .route("/audit/events", get(list_events).post(append_event))
        .route("/audit/verify", get(verify_ledger))
        .route("/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

/// Health check endpoint
async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        agent_id: AGENT_ID.to_string(),
        agent_version: AGENT_VERSION.to_string(),
        ledger_backend: state.ledger.backend().to_string(),
    })
}

/// Validate an intake record
async fn validate_intake(
    State(state): State<Arc<AppState>>,
    Json(record): Json<IntakeRecord>,
) -> Json<IntakeValidationResponse> {
    let response = {
        let _timer = state.metrics.validation().start_timer("intake");
        state.intake.validate(&record)
    };
    state.metrics.validation().record_validation(
        "intake",
        DecisionOutcome::from_issues(&response.issues),
        &response.issues,
    );
    Json(response)
}

/// Validate statements against supplied evidence
async fn validate_statements(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StatementValidationRequest>,
) -> Json<Vec<StatementValidationResult>> {
    let results = {
        let _timer = state.metrics.validation().start_timer("evidence");
        state
            .statements
            .validate(&request.statements, &request.evidence_objects)
    };
    state.metrics.validation().record_validation(
        "evidence",
        DecisionOutcome::from_statements(&results),
        &[],
    );
    Json(results)
}

/// Check a handoff packet for acceptance
async fn validate_packet(
    State(state): State<Arc<AppState>>,
    Json(packet): Json<HandoffPacket>,
) -> Json<PacketValidationResponse> {
    let response = {
        let _timer = state.metrics.validation().start_timer("packet");
        state.packets.validate(&packet)
    };
    state.metrics.validation().record_validation(
        "packet",
        DecisionOutcome::from_issues(&response.issues),
        &response.issues,
    );
    Json(response)
}

/// List every audit event in append order
async fn list_events(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<StoredEvent>>> {
    state.ledger.list().await.map(Json).map_err(ledger_error)
}

/// Append an audit event
async fn append_event(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AppendRequest>,
) -> ApiResult<(StatusCode, Json<StoredEvent>)> {
    let result = state.ledger.append(request).await;
    state.metrics.validation().record_append(result.is_ok());
    result
        .map(|event| (StatusCode::CREATED, Json(event)))
        .map_err(ledger_error)
}

/// Recompute and check the hash chain
async fn verify_ledger(State(state): State<Arc<AppState>>) -> ApiResult<Json<ChainVerification>> {
    let report = state.ledger.verify().await.map_err(ledger_error)?;
    if !report.intact {
        state.metrics.validation().record_verify_failure();
        tracing::error!(
            first_broken_index = ?report.first_broken_index,
            reason = ?report.reason,
            "Audit chain verification failed"
        );
    }
    Ok(Json(report))
}

/// Prometheus scrape endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let body = state.metrics.encode_text().map_err(|e| {
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "MetricsError", e.to_string())
    })?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}

fn api_error(
    status: StatusCode,
    error: &str,
    message: impl Into<String>,
) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: error.to_string(),
            message: message.into(),
            request_id: Some(Uuid::new_v4()),
        }),
    )
}

/// Map ledger faults onto HTTP statuses
fn ledger_error(err: LedgerError) -> (StatusCode, Json<ApiError>) {
    let (status, kind) = match &err {
        LedgerError::DuplicateEventId(_) => (StatusCode::CONFLICT, "DuplicateEventId"),
        LedgerError::InvalidEvent(_) => (StatusCode::UNPROCESSABLE_ENTITY, "InvalidEvent"),
        LedgerError::ChainBroken { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "ChainBroken"),
        LedgerError::Storage(_) | LedgerError::Serialization(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "StorageError")
        }
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "Audit ledger operation failed");
    } else {
        tracing::warn!(error = %err, "Audit append refused");
    }
    api_error(status, kind, err.to_string())
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub agent_id: String,
    pub agent_version: String,
    pub ledger_backend: String,
}

/// API error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub message: String,
    pub request_id: Option<Uuid>,
}
