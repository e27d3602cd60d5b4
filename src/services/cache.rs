use async_trait::async_trait;
use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Every key written by this service starts with this prefix
const KEY_PREFIX: &str = "estate-match";

/// Generation counters live under this prefix and survive a flush
const GENERATION_PREFIX: &str = "estate-match:generation:";

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// JSON response cache used by the search engine
///
/// Cached lists are keyed by a per-catalog generation. Writers bump the
/// generation instead of deleting keys, so a list computed before a write
/// lands under a key that is no longer read.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    /// Raw JSON stored under `key`, if any
    async fn get_json(&self, key: &str) -> Result<Option<String>, CacheError>;

    async fn set_json(&self, key: &str, json: String) -> Result<(), CacheError>;

    /// Drop every cached response. Generation counters are kept.
    async fn flush(&self) -> Result<(), CacheError>;

    /// Current generation, 0 if never bumped
    async fn generation(&self, key: &str) -> Result<u64, CacheError>;

    /// Advance the generation and return the new value
    async fn bump_generation(&self, key: &str) -> Result<u64, CacheError>;
}

/// Multi-tier cache manager
///
/// Implements L1 (in-memory) and L2 (Redis) caching strategy.
/// L1 is fastest but limited in size, L2 is shared across instances.
pub struct CacheManager {
    redis: Arc<tokio::sync::Mutex<ConnectionManager>>,
    l1_cache: moka::future::Cache<String, String>,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a new cache manager
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Ok(Self {
            redis: Arc::new(tokio::sync::Mutex::new(redis)),
            l1_cache,
            ttl_secs,
        })
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        match self.get_json(key).await? {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Err(CacheError::CacheMiss(key.to_string())),
        }
    }

    /// Set a value in cache (both L1 and L2)
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        self.set_json(key, serde_json::to_string(value)?).await
    }
}

#[async_trait]
impl ResponseCache for CacheManager {
    async fn get_json(&self, key: &str) -> Result<Option<String>, CacheError> {
        if let Some(json) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(Some(json));
        }

        let mut conn = self.redis.lock().await;
        let value: Option<String> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        drop(conn);

        match value {
            Some(json) => {
                tracing::trace!("L2 cache hit: {}", key);

                // Populate L1 cache
                self.l1_cache.insert(key.to_string(), json.clone()).await;
                Ok(Some(json))
            }
            None => {
                tracing::trace!("Cache miss: {}", key);
                Ok(None)
            }
        }
    }

    async fn set_json(&self, key: &str, json: String) -> Result<(), CacheError> {
        self.l1_cache.insert(key.to_string(), json.clone()).await;

        let mut conn = self.redis.lock().await;
        redis::cmd("SETEX")
            .arg(key)
            .arg(self.ttl_secs)
            .arg(json)
            .query_async::<()>(&mut *conn)
            .await?;
        drop(conn);

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    async fn flush(&self) -> Result<(), CacheError> {
        self.l1_cache.invalidate_all();

        let pattern = format!("{}:*", KEY_PREFIX);
        let mut conn = self.redis.lock().await;
        let keys: Vec<String> = redis::cmd("KEYS")
            .arg(&pattern)
            .query_async(&mut *conn)
            .await?;
        let keys: Vec<String> = keys
            .into_iter()
            .filter(|key| !key.starts_with(GENERATION_PREFIX))
            .collect();

        if !keys.is_empty() {
            redis::cmd("DEL")
                .arg(&keys)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::debug!("Flushed {} cache keys", keys.len());
        Ok(())
    }

    // Generations skip L1 so every instance sees a bump immediately
    async fn generation(&self, key: &str) -> Result<u64, CacheError> {
        let mut conn = self.redis.lock().await;
        let value: Option<u64> = redis::cmd("GET")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        Ok(value.unwrap_or(0))
    }

    async fn bump_generation(&self, key: &str) -> Result<u64, CacheError> {
        let mut conn = self.redis.lock().await;
        let value: u64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        tracing::debug!("Cache generation {} is now {}", key, value);
        Ok(value)
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Generation of every cached item response
    pub fn item_generation() -> String {
        format!("{}items", GENERATION_PREFIX)
    }

    /// Generation of every cached property response
    pub fn property_generation() -> String {
        format!("{}properties", GENERATION_PREFIX)
    }

    /// Lowest priced items still in stock
    pub fn low_priced_items(generation: u64) -> String {
        format!("{}:items:{}:low_priced", KEY_PREFIX, generation)
    }

    /// Lowest rent properties
    pub fn low_priced_properties(generation: u64) -> String {
        format!("{}:properties:{}:low_priced", KEY_PREFIX, generation)
    }

    /// Property detail
    pub fn property(generation: u64, id: i64) -> String {
        format!("{}:properties:{}:detail:{}", KEY_PREFIX, generation, id)
    }
}
