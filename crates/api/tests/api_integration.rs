//! Integration tests for the API server.

use std::sync::OnceLock;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceExt;
use uuid::Uuid;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

fn setup() -> Router {
    let config = api::config::Config::default();
    let state = api::create_default_state(&config);
    api::create_app(state, get_metrics_handle())
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> (StatusCode, serde_json::Value) {
    let request = match body {
        Some(json) => Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&json).unwrap()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn seed_stock(app: &Router, stock: i64) -> Uuid {
    let product_id = Uuid::new_v4();
    let (status, _) = send(
        app,
        "POST",
        "/stock",
        Some(serde_json::json!({ "product_id": product_id, "stock": stock })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    product_id
}

#[tokio::test]
async fn test_health_check() {
    let app = setup();
    let (status, json) = send(&app, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = setup();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_create_stock_record() {
    let app = setup();
    let product_id = seed_stock(&app, 10).await;

    let (status, json) = send(&app, "GET", &format!("/stock/{product_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stock"], 10);
    assert_eq!(json["on_shelf"], false);
}

#[tokio::test]
async fn test_duplicate_stock_record_conflicts() {
    let app = setup();
    let product_id = seed_stock(&app, 10).await;

    let (status, _) = send(
        &app,
        "POST",
        "/stock",
        Some(serde_json::json!({ "product_id": product_id, "stock": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_decrease_and_increase() {
    let app = setup();
    let product_id = seed_stock(&app, 10).await;

    let (status, _) = send(
        &app,
        "POST",
        "/stock/decrease",
        Some(serde_json::json!({ "product_id": product_id, "quantity": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/stock/increase",
        Some(serde_json::json!({ "product_id": product_id, "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (_, json) = send(&app, "GET", &format!("/stock/{product_id}"), None).await;
    assert_eq!(json["stock"], 7);
}

#[tokio::test]
async fn test_decrease_refuses_when_stock_is_short() {
    let app = setup();
    let product_id = seed_stock(&app, 3).await;

    let (status, _) = send(
        &app,
        "POST",
        "/stock/decrease",
        Some(serde_json::json!({ "product_id": product_id, "quantity": 5 })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // The refused decrement changed nothing.
    let (_, json) = send(&app, "GET", &format!("/stock/{product_id}"), None).await;
    assert_eq!(json["stock"], 3);
}

#[tokio::test]
async fn test_decrease_on_unknown_product_is_bad_request() {
    let app = setup();
    let (status, _) = send(
        &app,
        "POST",
        "/stock/decrease",
        Some(serde_json::json!({ "product_id": Uuid::new_v4(), "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_increase_on_unknown_product_is_not_found() {
    let app = setup();
    let (status, _) = send(
        &app,
        "POST",
        "/stock/increase",
        Some(serde_json::json!({ "product_id": Uuid::new_v4(), "quantity": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_on_shelf_listing() {
    let app = setup();
    let product_id = seed_stock(&app, 5).await;

    let (status, _) = send(
        &app,
        "PUT",
        &format!("/stock/{product_id}/on-shelf?on_shelf=true"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&app, "GET", "/stock/on-shelf-product-ids", None).await;
    assert_eq!(status, StatusCode::OK);
    let ids: Vec<String> = serde_json::from_value(json).unwrap();
    assert!(ids.contains(&product_id.to_string()));
}

#[tokio::test]
async fn test_batch_stock_lookup_omits_unknown_ids() {
    let app = setup();
    let product_id = seed_stock(&app, 5).await;
    let unknown = Uuid::new_v4();

    let (status, json) = send(
        &app,
        "POST",
        "/stock/batch",
        Some(serde_json::json!({ "product_ids": [product_id, unknown] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[product_id.to_string()], 5);
    assert!(json.get(unknown.to_string()).is_none());
}

#[tokio::test]
async fn test_delete_stock_record() {
    let app = setup();
    let product_id = seed_stock(&app, 5).await;

    let (status, _) = send(&app, "DELETE", &format!("/stock/{product_id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", &format!("/stock/{product_id}"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_order_reserves_stock() {
    let app = setup();
    let product_id = seed_stock(&app, 10).await;

    let (status, order) = send(
        &app,
        "POST",
        "/orders",
        Some(serde_json::json!({
            "product_id": product_id,
            "buyer_id": Uuid::new_v4(),
            "quantity": 4
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "ACTIVE");

    let (_, json) = send(&app, "GET", &format!("/stock/{product_id}"), None).await;
    assert_eq!(json["stock"], 6);

    let order_id = order["id"].as_str().unwrap();
    let (status, json) = send(&app, "GET", &format!("/orders/{order_id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ACTIVE");
}

#[tokio::test]
async fn test_create_order_with_zero_quantity_is_bad_request() {
    let app = setup();
    let product_id = seed_stock(&app, 10).await;

    let (status, _) = send(
        &app,
        "POST",
        "/orders",
        Some(serde_json::json!({
            "product_id": product_id,
            "buyer_id": Uuid::new_v4(),
            "quantity": 0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_order_for_unknown_product_is_not_found() {
    let app = setup();

    let (status, _) = send(
        &app,
        "POST",
        "/orders",
        Some(serde_json::json!({
            "product_id": Uuid::new_v4(),
            "buyer_id": Uuid::new_v4(),
            "quantity": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_order_without_stock_conflicts() {
    let app = setup();
    let product_id = seed_stock(&app, 2).await;

    let (status, _) = send(
        &app,
        "POST",
        "/orders",
        Some(serde_json::json!({
            "product_id": product_id,
            "buyer_id": Uuid::new_v4(),
            "quantity": 3
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // Nothing was reserved by the failed order.
    let (_, json) = send(&app, "GET", &format!("/stock/{product_id}"), None).await;
    assert_eq!(json["stock"], 2);
}

#[tokio::test]
async fn test_cancel_order_returns_stock() {
    let app = setup();
    let product_id = seed_stock(&app, 10).await;

    let (_, order) = send(
        &app,
        "POST",
        "/orders",
        Some(serde_json::json!({
            "product_id": product_id,
            "buyer_id": Uuid::new_v4(),
            "quantity": 4
        })),
    )
    .await;
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, cancelled) =
        send(&app, "POST", &format!("/orders/{order_id}/cancel"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");

    let (_, json) = send(&app, "GET", &format!("/stock/{product_id}"), None).await;
    assert_eq!(json["stock"], 10);

    // Cancelling again is a conflict, not a second release.
    let (status, _) = send(&app, "POST", &format!("/orders/{order_id}/cancel"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (_, json) = send(&app, "GET", &format!("/stock/{product_id}"), None).await;
    assert_eq!(json["stock"], 10);
}

#[tokio::test]
async fn test_get_unknown_order_is_not_found() {
    let app = setup();
    let (status, _) = send(&app, "GET", &format!("/orders/{}", Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
