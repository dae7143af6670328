use std::time::Instant;

use axum::{extract::State, Json};
use common_http_errors::ApiError;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::app_state::AppState;
use crate::extract::{ApiJson, ProductId};
use crate::store::{NewProduct, Product, StoreError};

#[derive(Debug, Deserialize)]
pub struct QuantityUpdate {
    #[serde(rename = "cantidad")]
    pub quantity: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct CreatedProduct {
    pub id: i64,
}

/// Rows affected by a mutating request.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct RowsChanged {
    #[serde(rename = "cambios")]
    pub changes: u64,
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateCode => ApiError::DuplicateCode,
            StoreError::Database(e) => ApiError::internal(e),
        }
    }
}

pub async fn list_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let store = state.store()?;
    let started = Instant::now();
    let result = store.list().await;
    state.track("list", started, &result);
    let products = result.map_err(|err| {
        warn!(error = %err, "failed to list products");
        ApiError::from(err)
    })?;
    debug!(count = products.len(), "listed products");
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    ApiJson(new_product): ApiJson<NewProduct>,
) -> Result<Json<CreatedProduct>, ApiError> {
    let store = state.store()?;
    let code = new_product.code.clone();
    let started = Instant::now();
    let result = store.create(new_product).await;
    state.track("create", started, &result);
    match result {
        Ok(id) => {
            info!(id, code = ?code, "product created");
            Ok(Json(CreatedProduct { id }))
        }
        Err(StoreError::DuplicateCode) => {
            info!(code = ?code, "rejected duplicate product code");
            Err(ApiError::DuplicateCode)
        }
        Err(err) => {
            warn!(error = %err, code = ?code, "failed to create product");
            Err(err.into())
        }
    }
}

pub async fn update_product_quantity(
    State(state): State<AppState>,
    ProductId(id): ProductId,
    ApiJson(update): ApiJson<QuantityUpdate>,
) -> Result<Json<RowsChanged>, ApiError> {
    let store = state.store()?;
    let started = Instant::now();
    let result = store.update_quantity(id, update.quantity).await;
    state.track("update_quantity", started, &result);
    let changes = result.map_err(|err| {
        warn!(error = %err, id, "failed to update product quantity");
        ApiError::from(err)
    })?;
    debug!(id, changes, quantity = ?update.quantity, "product quantity updated");
    Ok(Json(RowsChanged { changes }))
}

pub async fn delete_product(
    State(state): State<AppState>,
    ProductId(id): ProductId,
) -> Result<Json<RowsChanged>, ApiError> {
    let store = state.store()?;
    let started = Instant::now();
    let result = store.delete(id).await;
    state.track("delete", started, &result);
    let changes = result.map_err(|err| {
        warn!(error = %err, id, "failed to delete product");
        ApiError::from(err)
    })?;
    debug!(id, changes, "product deleted");
    Ok(Json(RowsChanged { changes }))
}
