//! API server entry point.

use std::sync::Arc;

use api::config::Config;
use orchestrator::{InMemoryOrderStore, OrderStore, PostgresOrderStore};
use remote::{
    GuardedStockService, GuardedUserDirectory, HttpStockService, HttpUserDirectory,
    InMemoryUserDirectory, LocalStockService, StockService, UserDirectory,
};
use sqlx::postgres::PgPoolOptions;
use stock_ledger::{InMemoryStockStore, PostgresStockStore, StockStore};
use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Pick stores: PostgreSQL when DATABASE_URL is set, in-memory
    //    otherwise
    let (ledger, orders): (Arc<dyn StockStore>, Arc<dyn OrderStore>) = match &config.database_url {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(url)
                .await
                .expect("failed to connect to database");
            let ledger = PostgresStockStore::new(pool.clone());
            ledger
                .run_migrations()
                .await
                .expect("failed to run migrations");
            tracing::info!("using PostgreSQL stores");
            (Arc::new(ledger), Arc::new(PostgresOrderStore::new(pool)))
        }
        None => {
            tracing::info!("using in-memory stores");
            (
                Arc::new(InMemoryStockStore::new()),
                Arc::new(InMemoryOrderStore::new()),
            )
        }
    };

    // 4. Pick service peers: remote over HTTP when a URL is set,
    //    in-process otherwise. Either way the calls go through a guard.
    let stock: Arc<dyn StockService> = match &config.stock_service_url {
        Some(url) => Arc::new(GuardedStockService::new(
            HttpStockService::new(url.clone(), config.remote_timeout)
                .expect("failed to build stock service client"),
            api::stock_guard(&config),
        )),
        None => Arc::new(GuardedStockService::new(
            LocalStockService::new(ledger.clone()),
            api::stock_guard(&config),
        )),
    };
    let users: Arc<dyn UserDirectory> = match &config.user_service_url {
        Some(url) => Arc::new(GuardedUserDirectory::new(
            HttpUserDirectory::new(url.clone(), config.remote_timeout)
                .expect("failed to build user service client"),
            api::user_guard(&config),
        )),
        None => Arc::new(GuardedUserDirectory::new(
            InMemoryUserDirectory::permissive(),
            api::user_guard(&config),
        )),
    };

    // 5. Build the application
    let state = api::create_state(orders, ledger, stock, users);
    let app = api::create_app(state, metrics_handle);

    // 6. Start server
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    tracing::info!("server shut down gracefully");
}
