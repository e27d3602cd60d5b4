//! Storage contract consumed by the search engine.
//!
//! The engine never talks to a database directly. Each catalog is reached
//! through a trait object so that PostgreSQL in production and the in-memory
//! store in tests are interchangeable.

use crate::models::{BoundingBox, CatalogRow, Item, OrderBy, Predicate, Property};
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a backing store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Operations shared by both catalogs
#[async_trait]
pub trait CatalogStore<R: CatalogRow>: Send + Sync {
    /// Number of rows matching the predicate
    async fn count(&self, predicate: &Predicate) -> Result<i64, StoreError>;

    /// Matching rows in `order`, after skipping `offset` rows, at most `limit`
    async fn select(
        &self,
        predicate: &Predicate,
        order: OrderBy,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<R>, StoreError>;

    async fn get_by_id(&self, id: i64) -> Result<Option<R>, StoreError>;

    /// Bulk insert; returns the number of rows written
    async fn insert(&self, rows: &[R]) -> Result<u64, StoreError>;

    /// Remove every row of the catalog
    async fn reset(&self) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ItemStore: CatalogStore<Item> {
    /// Decrement stock by one if it is still positive, atomically.
    /// Returns the new stock, or `None` when the item is missing or sold out.
    async fn conditional_decrement(&self, id: i64) -> Result<Option<i64>, StoreError>;
}

#[async_trait]
pub trait PropertyStore: CatalogStore<Property> {
    /// Every property whose position lies in the closed box, in `order`
    async fn select_box(
        &self,
        bbox: &BoundingBox,
        order: OrderBy,
    ) -> Result<Vec<Property>, StoreError>;
}
