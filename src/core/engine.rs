use crate::core::error::SearchError;
use crate::core::filters::{build_item_query, build_property_query};
use crate::core::geofence::Geofence;
use crate::core::matcher::Matcher;
use crate::core::ranges::{ConditionSet, RangeCatalog};
use crate::models::{
    split_features, Condition, Coordinate, ImportResponse, Item, ItemListResponse, ItemRecord,
    ItemSearchParams, ItemSearchResponse, OrderBy, Predicate, Property, PropertyListResponse,
    PropertyRecord, PropertySearchParams, PropertySearchResponse, PurchaseResponse,
};
use crate::services::{CacheKey, ItemStore, PropertyStore, ResponseCache, StoreError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use validator::Validate;

/// Result caps applied by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Size of the lowest-priced lists and of a recommendation
    pub list_limit: usize,
    /// Maximum number of properties returned by a polygon search
    pub nazotte_limit: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            list_limit: 20,
            nazotte_limit: 50,
        }
    }
}

/// Search and matching engine over the item and property catalogs
///
/// Every dependency is passed in explicitly so a fresh engine can be built
/// per test. The engine itself holds no mutable state; cache generations
/// live in the cache.
#[derive(Clone)]
pub struct SearchEngine {
    items: Arc<dyn ItemStore>,
    properties: Arc<dyn PropertyStore>,
    item_ranges: Arc<RangeCatalog>,
    property_ranges: Arc<RangeCatalog>,
    cache: Option<Arc<dyn ResponseCache>>,
    matcher: Matcher,
    limits: SearchLimits,
}

impl SearchEngine {
    pub fn new(
        items: Arc<dyn ItemStore>,
        properties: Arc<dyn PropertyStore>,
        item_ranges: Arc<RangeCatalog>,
        property_ranges: Arc<RangeCatalog>,
        limits: SearchLimits,
    ) -> Self {
        Self {
            items,
            properties,
            item_ranges,
            property_ranges,
            cache: None,
            matcher: Matcher::new(limits.list_limit),
            limits,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn limits(&self) -> SearchLimits {
        self.limits
    }

    // ---- items ---------------------------------------------------------

    /// Faceted item search: total count plus one page, popularity DESC, id ASC
    pub async fn search_items(
        &self,
        params: &ItemSearchParams,
    ) -> Result<ItemSearchResponse, SearchError> {
        let query = build_item_query(params, &self.item_ranges)?;

        let count = self.items.count(&query.predicate).await?;
        let items = self
            .items
            .select(
                &query.predicate,
                OrderBy::Popularity,
                query.pagination.limit,
                query.pagination.offset,
            )
            .await?;

        info!("Item search matched {} rows, returning {}", count, items.len());
        Ok(ItemSearchResponse { count, items })
    }

    /// Cheapest items still in stock
    ///
    /// The generation is read before the store query. A sale that lands while
    /// the query runs bumps it, so the list written afterwards is never served.
    pub async fn lowest_priced_items(&self) -> Result<ItemListResponse, SearchError> {
        let key = self
            .cache_generation(&CacheKey::item_generation())
            .await
            .map(CacheKey::low_priced_items);
        if let Some(hit) = self.cache_get(key.as_deref()).await {
            return Ok(hit);
        }

        let predicate = Predicate::new().and(Condition::InStock);
        let items = self
            .items
            .select(&predicate, OrderBy::LowestPrice, self.limits.list_limit as i64, 0)
            .await?;

        let response = ItemListResponse { items };
        self.cache_set(key.as_deref(), &response).await;
        Ok(response)
    }

    /// Item detail; sold out items are reported as missing
    pub async fn item_by_id(&self, id: i64) -> Result<Item, SearchError> {
        self.available_item(id).await
    }

    /// Buy one unit. The decrement is a single conditional update in the store.
    pub async fn purchase_item(&self, id: i64) -> Result<PurchaseResponse, SearchError> {
        let remaining = self
            .items
            .conditional_decrement(id)
            .await?
            .ok_or(SearchError::ItemNotFound(id))?;

        info!("Item {} purchased, {} left", id, remaining);
        if remaining == 0 {
            self.bump_generation(&CacheKey::item_generation()).await;
        }

        Ok(PurchaseResponse { id, remaining })
    }

    /// Bucket and store a batch of item rows
    pub async fn import_items(
        &self,
        records: Vec<ItemRecord>,
    ) -> Result<ImportResponse, SearchError> {
        let rows = records
            .into_iter()
            .map(|record| self.item_from_record(record))
            .collect::<Result<Vec<_>, _>>()?;

        let imported = self.items.insert(&rows).await.map_err(import_error)?;
        self.bump_generation(&CacheKey::item_generation()).await;

        info!("Imported {} items", imported);
        Ok(ImportResponse { imported })
    }

    pub fn item_conditions(&self) -> &ConditionSet {
        self.item_ranges.conditions()
    }

    // ---- properties ----------------------------------------------------

    /// Faceted property search: total count plus one page, popularity DESC, id ASC
    pub async fn search_properties(
        &self,
        params: &PropertySearchParams,
    ) -> Result<PropertySearchResponse, SearchError> {
        let query =
            build_property_query(params, &self.property_ranges)?;

        let count = self.properties.count(&query.predicate).await?;
        let properties = self
            .properties
            .select(
                &query.predicate,
                OrderBy::Popularity,
                query.pagination.limit,
                query.pagination.offset,
            )
            .await?;

        info!(
            "Property search matched {} rows, returning {}",
            count,
            properties.len()
        );
        Ok(PropertySearchResponse { count, properties })
    }

    /// Cheapest properties by rent
    pub async fn lowest_priced_properties(&self) -> Result<PropertyListResponse, SearchError> {
        let key = self
            .cache_generation(&CacheKey::property_generation())
            .await
            .map(CacheKey::low_priced_properties);
        if let Some(hit) = self.cache_get(key.as_deref()).await {
            return Ok(hit);
        }

        let properties = self
            .properties
            .select(
                &Predicate::new(),
                OrderBy::LowestPrice,
                self.limits.list_limit as i64,
                0,
            )
            .await?;

        let response = PropertyListResponse { properties };
        self.cache_set(key.as_deref(), &response).await;
        Ok(response)
    }

    pub async fn property_by_id(&self, id: i64) -> Result<Property, SearchError> {
        let key = self
            .cache_generation(&CacheKey::property_generation())
            .await
            .map(|generation| CacheKey::property(generation, id));
        if let Some(hit) = self.cache_get(key.as_deref()).await {
            return Ok(hit);
        }

        let property = self
            .properties
            .get_by_id(id)
            .await?
            .ok_or(SearchError::PropertyNotFound(id))?;

        self.cache_set(key.as_deref(), &property).await;
        Ok(property)
    }

    /// Properties inside a user-drawn polygon
    ///
    /// One bounding-box query to the store, then an exact ring test in
    /// memory. The reported count is the size of the truncated list.
    pub async fn search_polygon(
        &self,
        coordinates: &[Coordinate],
    ) -> Result<PropertySearchResponse, SearchError> {
        let fence = Geofence::new(coordinates)?;

        let candidates = self
            .properties
            .select_box(&fence.bounding_box(), OrderBy::Popularity)
            .await?;
        let candidate_count = candidates.len();

        let properties = fence.filter(candidates, self.limits.nazotte_limit);
        info!(
            "Polygon of {} points: {} candidates in box, {} returned",
            coordinates.len(),
            candidate_count,
            properties.len()
        );

        Ok(PropertySearchResponse {
            count: properties.len() as i64,
            properties,
        })
    }

    /// Properties whose door the given item fits through
    pub async fn recommend_for_item(
        &self,
        item_id: i64,
    ) -> Result<PropertyListResponse, SearchError> {
        let item = self.available_item(item_id).await?;
        let [first, second] = Matcher::hypotheses(&item);
        debug!("Item {} door fits: {:?}, {:?}", item_id, first, second);

        let limit = self.matcher.limit() as i64;
        let (first_predicate, second_predicate) = (first.predicate(), second.predicate());
        let (first_rows, second_rows) = tokio::try_join!(
            self.properties
                .select(&first_predicate, OrderBy::Popularity, limit, 0),
            self.properties
                .select(&second_predicate, OrderBy::Popularity, limit, 0),
        )?;

        let properties = self.matcher.merge(first_rows, second_rows);
        info!("Recommending {} properties for item {}", properties.len(), item_id);
        Ok(PropertyListResponse { properties })
    }

    /// Document request for a property; only existence is checked
    pub async fn request_document(&self, id: i64) -> Result<(), SearchError> {
        self.properties
            .get_by_id(id)
            .await?
            .ok_or(SearchError::PropertyNotFound(id))?;
        info!("Document requested for property {}", id);
        Ok(())
    }

    /// Bucket and store a batch of property rows
    pub async fn import_properties(
        &self,
        records: Vec<PropertyRecord>,
    ) -> Result<ImportResponse, SearchError> {
        let rows = records
            .into_iter()
            .map(|record| self.property_from_record(record))
            .collect::<Result<Vec<_>, _>>()?;

        let imported = self.properties.insert(&rows).await.map_err(import_error)?;
        self.bump_generation(&CacheKey::property_generation()).await;

        info!("Imported {} properties", imported);
        Ok(ImportResponse { imported })
    }

    pub fn property_conditions(&self) -> &ConditionSet {
        self.property_ranges.conditions()
    }

    // ---- maintenance ---------------------------------------------------

    /// Drop both catalogs and every cached entry
    pub async fn reset(&self) -> Result<(), SearchError> {
        self.items.reset().await?;
        self.properties.reset().await?;
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.flush().await {
                warn!("Failed to flush cache during reset: {}", e);
            }
        }
        // lists computed before the reset may still be written back
        self.bump_generation(&CacheKey::item_generation()).await;
        self.bump_generation(&CacheKey::property_generation()).await;
        info!("Catalogs reset");
        Ok(())
    }

    /// True when both stores answer
    pub async fn health_check(&self) -> bool {
        let items = self.items.health_check().await.unwrap_or(false);
        let properties = self.properties.health_check().await.unwrap_or(false);
        items && properties
    }

    // ---- helpers -------------------------------------------------------

    async fn available_item(&self, id: i64) -> Result<Item, SearchError> {
        self.items
            .get_by_id(id)
            .await?
            .filter(Item::is_available)
            .ok_or(SearchError::ItemNotFound(id))
    }

    fn item_from_record(&self, record: ItemRecord) -> Result<Item, SearchError> {
        record
            .validate()
            .map_err(|e| SearchError::Validation(format!("item {}: {}", record.id, e)))?;

        let ranges = &self.item_ranges;
        Ok(Item {
            price_range: ranges.classify("price", record.price)? as i64,
            height_range: ranges.classify("height", record.height)? as i64,
            width_range: ranges.classify("width", record.width)? as i64,
            depth_range: ranges.classify("depth", record.depth)? as i64,
            features_array: split_features(&record.features),
            id: record.id,
            name: record.name,
            description: record.description,
            thumbnail: record.thumbnail,
            price: record.price,
            height: record.height,
            width: record.width,
            depth: record.depth,
            color: record.color,
            features: record.features,
            kind: record.kind,
            popularity: record.popularity,
            stock: record.stock,
        })
    }

    fn property_from_record(&self, record: PropertyRecord) -> Result<Property, SearchError> {
        record
            .validate()
            .map_err(|e| SearchError::Validation(format!("property {}: {}", record.id, e)))?;

        let ranges = &self.property_ranges;
        Ok(Property {
            rent_range: ranges.classify("rent", record.rent)? as i64,
            door_height_range: ranges.classify("doorHeight", record.door_height)? as i64,
            door_width_range: ranges.classify("doorWidth", record.door_width)? as i64,
            features_array: split_features(&record.features),
            id: record.id,
            thumbnail: record.thumbnail,
            name: record.name,
            description: record.description,
            latitude: record.latitude,
            longitude: record.longitude,
            address: record.address,
            rent: record.rent,
            door_height: record.door_height,
            door_width: record.door_width,
            features: record.features,
            popularity: record.popularity,
        })
    }

    /// Generation to key cached responses under; `None` disables caching
    /// for this call
    async fn cache_generation(&self, key: &str) -> Option<u64> {
        let cache = self.cache.as_ref()?;
        match cache.generation(key).await {
            Ok(generation) => Some(generation),
            Err(e) => {
                warn!("Cache generation read failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn bump_generation(&self, key: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.bump_generation(key).await {
                warn!("Failed to bump cache generation {}: {}", key, e);
            }
        }
    }

    async fn cache_get<T: DeserializeOwned>(&self, key: Option<&str>) -> Option<T> {
        let (cache, key) = (self.cache.as_ref()?, key?);
        match cache.get_json(key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("Discarding unreadable cache entry {}: {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    async fn cache_set<T: Serialize + Sync>(&self, key: Option<&str>, value: &T) {
        let (Some(cache), Some(key)) = (&self.cache, key) else {
            return;
        };
        let result = match serde_json::to_string(value) {
            Ok(json) => cache.set_json(key, json).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!("Cache write failed for {}: {}", key, e);
        }
    }
}

/// Rows rejected by the store are the caller's fault
fn import_error(error: StoreError) -> SearchError {
    match error {
        StoreError::InvalidInput(message) => SearchError::Validation(message),
        other => SearchError::StoreUnavailable(other),
    }
}
