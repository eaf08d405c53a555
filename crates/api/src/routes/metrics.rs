//! Prometheus scrape endpoint.
//!
//! Exposes the saga counters (`orders_created_total`,
//! `orders_cancelled_total`, `orders_failed_total`) and the proxy's
//! `remote_fail_fast_total`, alongside whatever the exporter collects.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;

/// GET /metrics — Prometheus text exposition format.
pub async fn get(State(handle): State<PrometheusHandle>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        handle.render(),
    )
}
