//! HTTP API Integration Tests
//!
//! Drives the full router in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use shop_config::AppConfig;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use shop_platform::{api_router, build_dispatcher, ApiState, CacheManager, MemoryDocumentStore};

fn app() -> Router {
    let config = AppConfig::default();
    let store = MemoryDocumentStore::new();
    let dispatcher = build_dispatcher(Arc::new(store), CacheManager::in_memory(), &config).unwrap();
    let state = ApiState::new(Arc::new(dispatcher), CancellationToken::new());
    api_router(state, &config.http)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    customer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(customer) = customer {
        builder = builder.header("X-Customer-Id", customer);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };

    let response = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

#[tokio::test]
async fn test_health() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "UP");
}

#[tokio::test]
async fn test_category_lifecycle() {
    let app = app();

    let (status, created) = call(
        &app,
        Method::POST,
        "/api/categories",
        None,
        Some(json!({ "name": "Books", "description": "Paper" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let id = created["id"].as_str().unwrap().to_string();

    let (status, fetched) = call(
        &app,
        Method::GET,
        &format!("/api/categories/{}", id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["name"], "Books");

    let (status, conflict) = call(
        &app,
        Method::POST,
        "/api/categories",
        None,
        Some(json!({ "name": "books" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(conflict["error"], "CONFLICT");

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/categories/{}", id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, missing) = call(
        &app,
        Method::GET,
        &format!("/api/categories/{}", id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(missing["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_validation_errors_carry_details() {
    let app = app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/categories",
        None,
        Some(json!({ "name": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "VALIDATION_ERROR");
    assert_eq!(body["details"][0]["field"], "name");
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/api/products/not-a-number", None, None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_cart_requires_customer() {
    let app = app();

    let (status, body) = call(&app, Method::GET, "/api/cart", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "UNAUTHORIZED");

    let (status, _) = call(&app, Method::GET, "/api/cart", Some("nobody"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, cart) = call(&app, Method::GET, "/api/cart", Some("7"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["customerId"], "7");
}

#[tokio::test]
async fn test_checkout_flow() {
    let app = app();

    let (_, category) = call(
        &app,
        Method::POST,
        "/api/categories",
        None,
        Some(json!({ "name": "Stationery" })),
    )
    .await;
    let (status, product) = call(
        &app,
        Method::POST,
        "/api/products",
        None,
        Some(json!({
            "categoryId": category["id"],
            "name": "Pen",
            "priceCents": 250,
            "stock": 10
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["categoryName"], "Stationery");
    let product_id = product["id"].as_str().unwrap().to_string();

    let (status, cart) = call(
        &app,
        Method::POST,
        "/api/cart/items",
        Some("42"),
        Some(json!({ "productId": product_id, "quantity": 3 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["totalCents"], 750);

    let (status, order) = call(&app, Method::POST, "/api/orders", Some("42"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["status"], "PLACED");
    let order_id = order["id"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/orders/{}", order_id),
        Some("43"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, product) = call(
        &app,
        Method::GET,
        &format!("/api/products/{}", product_id),
        None,
        None,
    )
    .await;
    assert_eq!(product["stock"], 7);

    let (status, cancelled) = call(
        &app,
        Method::POST,
        &format!("/api/orders/{}/cancel", order_id),
        Some("42"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "CANCELLED");

    let (_, product) = call(
        &app,
        Method::GET,
        &format!("/api/products/{}", product_id),
        None,
        None,
    )
    .await;
    assert_eq!(product["stock"], 10);
}
