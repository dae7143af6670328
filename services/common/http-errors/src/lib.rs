use axum::{
    extract::Request,
    http::{HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use once_cell::sync::Lazy;
use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use serde::Serialize;
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

/// Fixed user-facing message for a rejected duplicate product code.
pub const DUPLICATE_CODE_MESSAGE: &str = "El código ya existe";
pub const NOT_READY_MESSAGE: &str = "La base de datos no está lista";

/// Distinct error codes tracked as metric labels before folding into `overflow`.
pub const MAX_ERROR_CODES: usize = 40;
const OVERFLOW_LABEL: &str = "overflow";

#[derive(Serialize, Debug)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug)]
pub enum ApiError {
    NotReady,
    DuplicateCode,
    BadRequest { code: &'static str, message: String },
    Internal { message: String },
}

impl ApiError {
    pub fn internal<E: std::fmt::Display>(e: E) -> Self { Self::Internal { message: e.to_string() } }
    pub fn bad_request<M: Into<String>>(code: &'static str, message: M) -> Self { Self::BadRequest { code, message: message.into() } }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotReady => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::DuplicateCode | ApiError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable label written to the `X-Error-Code` header.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::NotReady => "store_not_ready",
            ApiError::DuplicateCode => "duplicate_code",
            ApiError::BadRequest { code, .. } => *code,
            ApiError::Internal { .. } => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_code = self.code();
        let error = match self {
            ApiError::NotReady => NOT_READY_MESSAGE.to_string(),
            ApiError::DuplicateCode => DUPLICATE_CODE_MESSAGE.to_string(),
            ApiError::BadRequest { message, .. } => message,
            ApiError::Internal { message } => message,
        };
        let mut resp = (status, Json(ErrorBody { error })).into_response();
        if let Ok(val) = HeaderValue::from_str(error_code) {
            resp.headers_mut().insert("X-Error-Code", val);
        }
        resp
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub static HTTP_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    let v = IntCounterVec::new(
        Opts::new("http_errors_total", "Count of HTTP error responses emitted (status >= 400)"),
        &["service", "code", "status"],
    )
    .expect("valid http_errors_total definition");
    REGISTRY.register(Box::new(v.clone())).ok();
    v
});

static ERROR_CODES_DISTINCT: Lazy<IntGauge> = Lazy::new(|| {
    let g = IntGauge::new("http_error_codes_distinct", "Distinct error code labels currently tracked")
        .expect("valid http_error_codes_distinct definition");
    REGISTRY.register(Box::new(g.clone())).ok();
    g
});

static ERROR_CODE_OVERFLOW: Lazy<IntCounter> = Lazy::new(|| {
    let c = IntCounter::new("http_error_code_overflow_total", "Error responses whose code was folded into the overflow label")
        .expect("valid http_error_code_overflow_total definition");
    REGISTRY.register(Box::new(c.clone())).ok();
    c
});

static SEEN_CODES: Lazy<Mutex<HashSet<String>>> = Lazy::new(|| Mutex::new(HashSet::new()));

/// Registry holding the HTTP error collectors; gathered alongside service metrics.
pub fn error_registry() -> &'static Registry {
    Lazy::force(&HTTP_ERRORS_TOTAL);
    Lazy::force(&ERROR_CODES_DISTINCT);
    Lazy::force(&ERROR_CODE_OVERFLOW);
    &REGISTRY
}

fn code_label(code: &str) -> String {
    let Ok(mut seen) = SEEN_CODES.lock() else {
        return OVERFLOW_LABEL.to_string();
    };
    if seen.contains(code) {
        return code.to_string();
    }
    if seen.len() >= MAX_ERROR_CODES {
        ERROR_CODE_OVERFLOW.inc();
        return OVERFLOW_LABEL.to_string();
    }
    seen.insert(code.to_string());
    ERROR_CODES_DISTINCT.set(seen.len() as i64);
    code.to_string()
}

pub fn record_http_error(service: &str, code: &str, status: StatusCode) {
    let label = code_label(code);
    HTTP_ERRORS_TOTAL
        .with_label_values(&[service, &label, status.as_str()])
        .inc();
}

type MiddlewareFuture = Pin<Box<dyn Future<Output = Response> + Send>>;

/// Middleware counting every response with status >= 400, labelled by `X-Error-Code`.
/// Use with `axum::middleware::from_fn(http_error_metrics_layer("svc"))`.
pub fn http_error_metrics_layer(
    service: &'static str,
) -> impl Fn(Request, Next) -> MiddlewareFuture + Clone + Send + Sync + 'static {
    move |req: Request, next: Next| -> MiddlewareFuture {
        Box::pin(async move {
            let resp = next.run(req).await;
            let status = resp.status();
            if status.as_u16() >= 400 {
                let code = resp
                    .headers()
                    .get("x-error-code")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                record_http_error(service, code, status);
            }
            resp
        })
    }
}

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use super::*;

    pub fn simulate_error_code(code: &str) {
        record_http_error("test-helpers", code, StatusCode::BAD_REQUEST);
    }

    pub fn distinct_gauge() -> i64 {
        ERROR_CODES_DISTINCT.get()
    }

    pub fn overflow_count() -> u64 {
        ERROR_CODE_OVERFLOW.get()
    }
}
