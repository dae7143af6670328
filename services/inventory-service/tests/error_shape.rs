use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt; // for oneshot

use test_utils::{json_request, memory_app, pending_app, send};

#[tokio::test]
async fn requests_before_store_is_ready_get_not_ready() {
    let app = pending_app();
    for (method, uri, body) in [
        (Method::GET, "/api/productos", None),
        (Method::POST, "/api/productos", Some(json!({ "codigo": "A1" }))),
        (Method::PUT, "/api/productos/1", Some(json!({ "cantidad": 1 }))),
        (Method::DELETE, "/api/productos/1", None),
    ] {
        let resp = app.clone().oneshot(json_request(method.clone(), uri, body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE, "{method} {uri}");
        assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "store_not_ready");
    }
    let (_, body) = send(&app, Method::GET, "/api/productos", None).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_json_is_a_400_with_error_body() {
    let app = memory_app().await;
    let req = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/productos")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "invalid_body");
}

#[tokio::test]
async fn wrongly_typed_quantity_is_rejected_at_boundary() {
    let app = memory_app().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/productos",
        Some(json!({ "codigo": "A1", "nombre": "Widget", "cantidad": "ten", "minimo": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("cantidad"), "body was: {body}");
    let (_, listed) = send(&app, Method::GET, "/api/productos", None).await;
    assert_eq!(listed, json!([]));
}

#[tokio::test]
async fn non_numeric_id_is_a_400() {
    let app = memory_app().await;
    let (status, body) = send(&app, Method::DELETE, "/api/productos/abc", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn duplicate_code_sets_error_code_header() {
    let app = memory_app().await;
    let body = json!({ "codigo": "H1", "nombre": "Header", "cantidad": 1, "minimo": 0 });
    send(&app, Method::POST, "/api/productos", Some(body.clone())).await;
    let resp = app
        .oneshot(json_request(Method::POST, "/api/productos", Some(body)))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "duplicate_code");
}
