//! SQLite-backed persistence for the `productos` table.
//!
//! Every public operation issues exactly one SQL statement. The store owns
//! the `fecha` column: rows are stamped from a per-store monotonic clock so
//! that each stamp is strictly newer than the previous one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Path value that selects a private in-memory database.
pub const MEMORY_PATH: &str = ":memory:";

pub(crate) const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS productos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        codigo TEXT UNIQUE,
        nombre TEXT,
        cantidad INTEGER,
        minimo INTEGER,
        fecha DATETIME DEFAULT CURRENT_TIMESTAMP
    )";

pub(crate) const LIST_PRODUCTS_SQL: &str =
    "SELECT id, codigo, nombre, cantidad, minimo, fecha FROM productos ORDER BY fecha DESC";

pub(crate) const INSERT_PRODUCT_SQL: &str =
    "INSERT INTO productos (codigo, nombre, cantidad, minimo, fecha) VALUES (?, ?, ?, ?, ?)";

pub(crate) const UPDATE_QUANTITY_SQL: &str =
    "UPDATE productos SET cantidad = ?, fecha = ? WHERE id = ?";

pub(crate) const DELETE_PRODUCT_SQL: &str = "DELETE FROM productos WHERE id = ?";

// Same shape as SQLite's CURRENT_TIMESTAMP with a fixed-width fraction, so
// text order matches time order for both old and new rows.
const FECHA_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("product code already exists")]
    DuplicateCode,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::DuplicateCode,
        _ => StoreError::Database(err),
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub path: String,
    pub max_connections: u32,
}

impl StoreConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), max_connections: 1 }
    }

    pub fn in_memory() -> Self {
        Self::new(MEMORY_PATH)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: i64,
    #[serde(rename = "codigo")]
    #[sqlx(rename = "codigo")]
    pub code: Option<String>,
    #[serde(rename = "nombre")]
    #[sqlx(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "cantidad")]
    #[sqlx(rename = "cantidad")]
    pub quantity: Option<i64>,
    #[serde(rename = "minimo")]
    #[sqlx(rename = "minimo")]
    pub minimum: Option<i64>,
    #[serde(rename = "fecha")]
    #[sqlx(rename = "fecha")]
    pub updated_at: DateTime<Utc>,
}

/// Create payload. Absent fields are stored as NULL.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewProduct {
    #[serde(rename = "codigo")]
    pub code: Option<String>,
    #[serde(rename = "nombre")]
    pub name: Option<String>,
    #[serde(rename = "cantidad")]
    pub quantity: Option<i64>,
    #[serde(rename = "minimo")]
    pub minimum: Option<i64>,
}

#[derive(Debug, Default)]
struct StampClock {
    last_micros: AtomicI64,
}

impl StampClock {
    fn next(&self) -> DateTime<Utc> {
        let now = Utc::now().timestamp_micros();
        let prev = self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| Some(now.max(last + 1)))
            .unwrap_or_else(|last| last);
        DateTime::from_timestamp_micros(now.max(prev + 1)).unwrap_or_else(Utc::now)
    }

    fn next_text(&self) -> String {
        self.next().format(FECHA_FORMAT).to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ProductStore {
    pool: SqlitePool,
    clock: Arc<StampClock>,
}

impl ProductStore {
    /// Open (creating if missing) the database and ensure the table exists.
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = if config.path == MEMORY_PATH {
            // each in-memory connection is its own database; pin exactly one
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(SqliteConnectOptions::from_str("sqlite::memory:")?)
                .await?
        } else {
            let options = SqliteConnectOptions::new()
                .filename(&config.path)
                .create_if_missing(true);
            SqlitePoolOptions::new()
                .max_connections(config.max_connections.max(1))
                .connect_with(options)
                .await?
        };
        sqlx::query(CREATE_TABLE_SQL).execute(&pool).await?;
        tracing::debug!(path = %config.path, "product table ready");
        Ok(Self { pool, clock: Arc::new(StampClock::default()) })
    }

    pub async fn list(&self) -> Result<Vec<Product>, StoreError> {
        let products = sqlx::query_as::<_, Product>(LIST_PRODUCTS_SQL)
            .fetch_all(&self.pool)
            .await?;
        Ok(products)
    }

    /// Insert a product and return its store-assigned id.
    pub async fn create(&self, product: NewProduct) -> Result<i64, StoreError> {
        let result = sqlx::query(INSERT_PRODUCT_SQL)
            .bind(product.code)
            .bind(product.name)
            .bind(product.quantity)
            .bind(product.minimum)
            .bind(self.clock.next_text())
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.last_insert_rowid())
    }

    /// Set `cantidad` and refresh `fecha`; returns rows affected.
    pub async fn update_quantity(&self, id: i64, quantity: Option<i64>) -> Result<u64, StoreError> {
        let result = sqlx::query(UPDATE_QUANTITY_SQL)
            .bind(quantity)
            .bind(self.clock.next_text())
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(classify)?;
        Ok(result.rows_affected())
    }

    pub async fn delete(&self, id: i64) -> Result<u64, StoreError> {
        let result = sqlx::query(DELETE_PRODUCT_SQL)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub fn is_closed(&self) -> bool {
        self.pool.is_closed()
    }
}
