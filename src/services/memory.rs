use crate::core::geofence::is_within_bounding_box;
use crate::core::ranking::sort_ranked;
use crate::models::{BoundingBox, CatalogRow, Item, OrderBy, Predicate, Property};
use crate::services::store::{CatalogStore, ItemStore, PropertyStore, StoreError};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use tokio::sync::RwLock;

/// In-process catalog store
///
/// Rows live in a `BTreeMap` keyed by id behind a `RwLock`. Used by the
/// `memory` backend and throughout the tests.
#[derive(Debug)]
pub struct MemoryStore<R> {
    rows: RwLock<BTreeMap<i64, R>>,
}

impl<R: CatalogRow> Default for MemoryStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: CatalogRow> MemoryStore<R> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_rows(rows: Vec<R>) -> Self {
        Self {
            rows: RwLock::new(rows.into_iter().map(|r| (r.id(), r)).collect()),
        }
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }

    async fn matching(&self, predicate: &Predicate, order: OrderBy) -> Vec<R> {
        let rows = self.rows.read().await;
        let mut matched: Vec<R> = rows
            .values()
            .filter(|row| predicate.matches(*row))
            .cloned()
            .collect();
        sort_ranked(&mut matched, order);
        matched
    }
}

fn to_usize(value: i64, name: &str) -> Result<usize, StoreError> {
    usize::try_from(value).map_err(|_| StoreError::InvalidInput(format!("negative {}", name)))
}

#[async_trait]
impl<R: CatalogRow> CatalogStore<R> for MemoryStore<R> {
    async fn count(&self, predicate: &Predicate) -> Result<i64, StoreError> {
        let rows = self.rows.read().await;
        Ok(rows.values().filter(|row| predicate.matches(*row)).count() as i64)
    }

    async fn select(
        &self,
        predicate: &Predicate,
        order: OrderBy,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<R>, StoreError> {
        let limit = to_usize(limit, "limit")?;
        let offset = to_usize(offset, "offset")?;

        Ok(self
            .matching(predicate, order)
            .await
            .into_iter()
            .skip(offset)
            .take(limit)
            .collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<R>, StoreError> {
        Ok(self.rows.read().await.get(&id).cloned())
    }

    async fn insert(&self, rows: &[R]) -> Result<u64, StoreError> {
        let mut stored = self.rows.write().await;
        // nothing is written unless every id is new, both to the store and to the batch
        let mut batch = HashSet::with_capacity(rows.len());
        if let Some(duplicate) = rows
            .iter()
            .find(|r| stored.contains_key(&r.id()) || !batch.insert(r.id()))
        {
            return Err(StoreError::InvalidInput(format!(
                "duplicate id {}",
                duplicate.id()
            )));
        }

        for row in rows {
            stored.insert(row.id(), row.clone());
        }
        tracing::debug!("Inserted {} rows into memory store", rows.len());
        Ok(rows.len() as u64)
    }

    async fn reset(&self) -> Result<(), StoreError> {
        self.rows.write().await.clear();
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[async_trait]
impl ItemStore for MemoryStore<Item> {
    async fn conditional_decrement(&self, id: i64) -> Result<Option<i64>, StoreError> {
        // check and decrement under one write lock
        let mut rows = self.rows.write().await;
        Ok(rows.get_mut(&id).filter(|item| item.stock > 0).map(|item| {
            item.stock -= 1;
            item.stock
        }))
    }
}

#[async_trait]
impl PropertyStore for MemoryStore<Property> {
    async fn select_box(
        &self,
        bbox: &BoundingBox,
        order: OrderBy,
    ) -> Result<Vec<Property>, StoreError> {
        let rows = self.rows.read().await;
        let mut matched: Vec<Property> = rows
            .values()
            .filter(|p| is_within_bounding_box(p.latitude, p.longitude, bbox))
            .cloned()
            .collect();
        sort_ranked(&mut matched, order);
        Ok(matched)
    }
}
