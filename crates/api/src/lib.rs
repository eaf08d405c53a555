//! HTTP API server for the order and stock services.
//!
//! Exposes the order saga and the stock ledger as REST endpoints, with
//! structured logging (tracing) and Prometheus metrics. The same binary
//! serves both surfaces; environment variables decide whether its
//! dependencies are in-process or remote peers.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use orchestrator::{InMemoryOrderStore, OrderOrchestrator, OrderStore};
use remote::{
    CircuitBreaker, Guard, GuardedStockService, GuardedUserDirectory, InMemoryUserDirectory,
    LocalStockService, StockService, UserDirectory,
};
use stock_ledger::{InMemoryStockStore, StockStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;

/// Shared application state accessible from all handlers.
///
/// Dependencies are held as trait objects because the wiring is decided
/// at startup from the environment: the same handlers run against
/// in-memory stores, PostgreSQL, or remote HTTP peers.
pub struct AppState {
    pub orchestrator:
        OrderOrchestrator<Arc<dyn OrderStore>, Arc<dyn StockService>, Arc<dyn UserDirectory>>,
    pub ledger: Arc<dyn StockStore>,
}

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create))
        .route("/orders/{id}", get(routes::orders::get))
        .route("/orders/{id}/cancel", post(routes::orders::cancel))
        .route("/stock", post(routes::stock::create))
        .route("/stock/decrease", post(routes::stock::decrease))
        .route("/stock/increase", post(routes::stock::increase))
        .route("/stock/batch", post(routes::stock::batch))
        .route(
            "/stock/on-shelf-product-ids",
            get(routes::stock::on_shelf_product_ids),
        )
        .route("/stock/{product_id}", get(routes::stock::get))
        .route("/stock/{product_id}", delete(routes::stock::remove))
        .route(
            "/stock/{product_id}/on-shelf",
            put(routes::stock::set_on_shelf),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Guard for calls into the stock ledger.
pub fn stock_guard(config: &Config) -> Guard {
    Guard::new(
        "stock-service",
        config.remote_timeout,
        CircuitBreaker::new(config.breaker_max_failures, config.breaker_cooldown),
    )
}

/// Guard for calls into the user directory.
pub fn user_guard(config: &Config) -> Guard {
    Guard::new(
        "user-service",
        config.remote_timeout,
        CircuitBreaker::new(config.breaker_max_failures, config.breaker_cooldown),
    )
}

/// Assembles the shared state from already-wired dependencies.
pub fn create_state(
    orders: Arc<dyn OrderStore>,
    ledger: Arc<dyn StockStore>,
    stock: Arc<dyn StockService>,
    users: Arc<dyn UserDirectory>,
) -> Arc<AppState> {
    Arc::new(AppState {
        orchestrator: OrderOrchestrator::new(orders, stock, users),
        ledger,
    })
}

/// Standalone wiring: in-memory stores, an in-process stock service and
/// a permissive user directory, all behind guards.
pub fn create_default_state(config: &Config) -> Arc<AppState> {
    let ledger: Arc<dyn StockStore> = Arc::new(InMemoryStockStore::new());
    let stock: Arc<dyn StockService> = Arc::new(GuardedStockService::new(
        LocalStockService::new(ledger.clone()),
        stock_guard(config),
    ));
    let users: Arc<dyn UserDirectory> = Arc::new(GuardedUserDirectory::new(
        InMemoryUserDirectory::permissive(),
        user_guard(config),
    ));
    let orders: Arc<dyn OrderStore> = Arc::new(InMemoryOrderStore::new());

    create_state(orders, ledger, stock, users)
}
