use std::sync::Arc;
use std::time::Instant;

use common_http_errors::ApiError;
use common_observability::InventoryMetrics;

use crate::store::{ProductStore, StoreError};

/// Shared application state used by handlers. The store is injected once at
/// startup; a state without one answers every product request with `NotReady`.
#[derive(Clone)]
pub struct AppState {
    store: Option<ProductStore>,
    pub metrics: Arc<InventoryMetrics>,
}

impl AppState {
    pub fn new(store: ProductStore, metrics: Arc<InventoryMetrics>) -> Self {
        metrics.store_ready.set(1);
        Self { store: Some(store), metrics }
    }

    pub fn pending(metrics: Arc<InventoryMetrics>) -> Self {
        metrics.store_ready.set(0);
        Self { store: None, metrics }
    }

    pub fn store(&self) -> Result<&ProductStore, ApiError> {
        self.store.as_ref().ok_or(ApiError::NotReady)
    }

    /// Record latency and outcome of one store call.
    pub(crate) fn track<T>(&self, operation: &'static str, started: Instant, result: &Result<T, StoreError>) {
        self.metrics.observe_store(operation, started.elapsed().as_secs_f64());
        let outcome = match result {
            Ok(_) => "ok",
            Err(StoreError::DuplicateCode) => "duplicate_code",
            Err(StoreError::Database(_)) => "error",
        };
        self.metrics.record_operation(operation, outcome);
    }
}
