//! Order saga endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use orchestrator::{CreateOrderRequest, Order};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

/// POST /orders — place an order for a quantity of one product.
#[tracing::instrument(skip(state, req))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Order>), ApiError> {
    let order = state.orchestrator.create_order(req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /orders/{id} — fetch an order.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orchestrator
        .get_order(OrderId::from_uuid(id))
        .await?;
    Ok(Json(order))
}

/// POST /orders/{id}/cancel — cancel an active order, returning its
/// stock to the ledger.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, ApiError> {
    let order = state
        .orchestrator
        .cancel_order(OrderId::from_uuid(id))
        .await?;
    Ok(Json(order))
}
