use axum::{Router, routing::get, http::{Method, Request, StatusCode}};
use common_http_errors::ApiError;
use inventory_service::{build_router, AppState, ProductStore, StoreConfig};
use common_observability::InventoryMetrics;
use std::sync::Arc;
use tower::ServiceExt;


#[tokio::test]
async fn store_failure_returns_500_with_message() {
    let store = ProductStore::open(&StoreConfig::in_memory()).await.unwrap();
    let app = build_router(AppState::new(store.clone(), Arc::new(InventoryMetrics::new())));
    store.close().await;
    let (status, body) = test_utils::send(&app, Method::GET, "/api/productos", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["error"].as_str().unwrap().is_empty(), "body was: {body}");
}

#[tokio::test]
async fn internal_error_500() {
    async fn boom() -> Result<String, ApiError> { Err(ApiError::internal("synthetic")) }
    let app = Router::new().route("/boom", get(boom));
    let req = Request::builder().uri("/boom").method("GET").body(axum::body::Body::empty()).unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "internal_error");
}
