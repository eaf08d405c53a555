//! Stock ledger endpoints.

use std::collections::HashMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::ProductId;
use serde::Deserialize;
use stock_ledger::{LedgerError, StockRecord, StockStore};
use uuid::Uuid;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateRecordRequest {
    pub product_id: ProductId,
    pub stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct StockMutationRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub product_ids: Vec<ProductId>,
}

#[derive(Debug, Deserialize)]
pub struct OnShelfQuery {
    pub on_shelf: bool,
}

/// POST /stock — register a product with its initial stock.
#[tracing::instrument(skip(state, req), fields(product_id = %req.product_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRecordRequest>,
) -> Result<(StatusCode, Json<StockRecord>), ApiError> {
    let record = state.ledger.create_record(req.product_id, req.stock).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// POST /stock/decrease — atomically reserve stock.
///
/// A missing record is the caller's mistake here, not a lookup miss, so
/// it answers 400 rather than 404.
#[tracing::instrument(skip(state, req), fields(product_id = %req.product_id))]
pub async fn decrease(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StockMutationRequest>,
) -> Result<StatusCode, ApiError> {
    state
        .ledger
        .conditional_decrement(req.product_id, req.quantity)
        .await
        .map_err(|err| match err {
            LedgerError::NotFound { product_id } => {
                ApiError::BadRequest(format!("no stock record for product {product_id}"))
            }
            other => ApiError::Ledger(other),
        })?;
    Ok(StatusCode::OK)
}

/// POST /stock/increase — return stock to the ledger.
#[tracing::instrument(skip(state, req), fields(product_id = %req.product_id))]
pub async fn increase(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StockMutationRequest>,
) -> Result<StatusCode, ApiError> {
    state.ledger.increment(req.product_id, req.quantity).await?;
    Ok(StatusCode::OK)
}

/// GET /stock/{product_id} — fetch one stock record.
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<StockRecord>, ApiError> {
    let product_id = ProductId::from_uuid(product_id);
    let record = state
        .ledger
        .get_record(product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no stock record for product {product_id}")))?;
    Ok(Json(record))
}

/// PUT /stock/{product_id}/on-shelf — set the on-shelf flag.
#[tracing::instrument(skip(state))]
pub async fn set_on_shelf(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
    Query(query): Query<OnShelfQuery>,
) -> Result<StatusCode, ApiError> {
    state
        .ledger
        .set_on_shelf(ProductId::from_uuid(product_id), query.on_shelf)
        .await?;
    Ok(StatusCode::OK)
}

/// POST /stock/batch — stock levels for a set of products; unknown ids
/// are omitted.
#[tracing::instrument(skip(state, req))]
pub async fn batch(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BatchRequest>,
) -> Result<Json<HashMap<ProductId, i64>>, ApiError> {
    let stocks = state.ledger.get_stocks_by_ids(&req.product_ids).await?;
    Ok(Json(stocks))
}

/// GET /stock/on-shelf-product-ids — ids of all on-shelf products.
#[tracing::instrument(skip(state))]
pub async fn on_shelf_product_ids(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductId>>, ApiError> {
    let ids = state.ledger.on_shelf_product_ids().await?;
    Ok(Json(ids))
}

/// DELETE /stock/{product_id} — remove a stock record.
#[tracing::instrument(skip(state))]
pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state
        .ledger
        .delete_record(ProductId::from_uuid(product_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
