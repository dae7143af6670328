use common_http_errors::{ApiError, DUPLICATE_CODE_MESSAGE, NOT_READY_MESSAGE};
use axum::response::IntoResponse;
use axum::http::StatusCode;
use http_body_util::BodyExt;

async fn body_json(resp: axum::response::Response) -> serde_json::Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn not_ready_variant() {
    let resp = ApiError::NotReady.into_response();
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "store_not_ready");
    assert_eq!(body_json(resp).await, serde_json::json!({ "error": NOT_READY_MESSAGE }));
}

#[tokio::test]
async fn duplicate_code_variant_uses_fixed_message() {
    let resp = ApiError::DuplicateCode.into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "duplicate_code");
    assert_eq!(body_json(resp).await, serde_json::json!({ "error": "El código ya existe" }));
    assert_eq!(DUPLICATE_CODE_MESSAGE, "El código ya existe");
}

#[tokio::test]
async fn bad_request_variant() {
    let resp = ApiError::bad_request("invalid_body", "expected an integer").into_response();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "invalid_body");
    assert_eq!(body_json(resp).await["error"], "expected an integer");
}

#[tokio::test]
async fn internal_variant_carries_underlying_message() {
    let resp = ApiError::internal("disk I/O error").into_response();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(resp.headers().get("X-Error-Code").unwrap(), "internal_error");
    assert_eq!(body_json(resp).await, serde_json::json!({ "error": "disk I/O error" }));
}
