//! Liveness endpoint for the order/stock server.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health — liveness only; says nothing about the ledger or the
/// user directory being reachable.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
