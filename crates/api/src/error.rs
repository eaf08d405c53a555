//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use orchestrator::OrchestratorError;
use stock_ledger::LedgerError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Order saga error.
    Orchestrator(OrchestratorError),
    /// Stock ledger error.
    Ledger(LedgerError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Orchestrator(err) => orchestrator_error_to_response(err),
            ApiError::Ledger(err) => ledger_error_to_response(err),
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn orchestrator_error_to_response(err: OrchestratorError) -> (StatusCode, String) {
    match &err {
        OrchestratorError::Validation { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        OrchestratorError::UserNotFound { .. }
        | OrchestratorError::OrderNotFound { .. }
        | OrchestratorError::ProductNotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        OrchestratorError::InsufficientStock { .. } | OrchestratorError::Conflict { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        OrchestratorError::ServiceUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, err.to_string())
        }
        OrchestratorError::Inconsistency { .. } => {
            tracing::error!(error = %err, "order left inconsistent");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
        OrchestratorError::Store(_) => {
            tracing::error!(error = %err, "order store failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn ledger_error_to_response(err: LedgerError) -> (StatusCode, String) {
    match &err {
        LedgerError::NotFound { .. } => (StatusCode::NOT_FOUND, err.to_string()),
        LedgerError::AlreadyExists { .. } | LedgerError::InsufficientStock { .. } => {
            (StatusCode::CONFLICT, err.to_string())
        }
        LedgerError::InvalidStock { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        LedgerError::Database(_) => {
            tracing::error!(error = %err, "ledger database failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<OrchestratorError> for ApiError {
    fn from(err: OrchestratorError) -> Self {
        ApiError::Orchestrator(err)
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        ApiError::Ledger(err)
    }
}
