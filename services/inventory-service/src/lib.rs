pub mod app_state;
pub mod config;
pub mod extract;
pub mod product_handlers;
pub mod store;

pub use app_state::AppState;
pub use config::{ConfigError, ServiceConfig};
pub use product_handlers::*;
pub use store::{NewProduct, Product, ProductStore, StoreConfig, StoreError};

use std::path::Path;

use axum::{
    extract::State,
    http::{
        header::{ACCEPT, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware,
    routing::{get, put},
    Router,
};
use common_http_errors::{error_registry, http_error_metrics_layer};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;

pub const SERVICE_NAME: &str = "inventory-service";

async fn health() -> &'static str {
    "ok"
}

async fn metrics_endpoint(State(state): State<AppState>) -> (StatusCode, String) {
    match state.metrics.encode(&[error_registry()]) {
        Ok(text) => (StatusCode::OK, text),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("metrics encode error: {e}"),
        ),
    }
}

/// JSON API, health and metrics routes with error metrics applied.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/productos", get(list_products).post(create_product))
        .route(
            "/api/productos/:id",
            put(update_product_quantity).delete(delete_product),
        )
        .with_state(state)
        .layer(middleware::from_fn(http_error_metrics_layer(SERVICE_NAME)))
}

/// Serve files under `dir` for any path the API does not claim. No-op when the directory is absent.
pub fn with_static_dir(router: Router, dir: &Path) -> Router {
    if dir.is_dir() {
        router.fallback_service(ServeDir::new(dir))
    } else {
        tracing::debug!(dir = %dir.display(), "static directory not found, skipping");
        router
    }
}

pub fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(
            allowed_origins
                .iter()
                .filter_map(|origin| origin.parse::<HeaderValue>().ok())
                .collect::<Vec<_>>(),
        ))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([ACCEPT, CONTENT_TYPE])
}
