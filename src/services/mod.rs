// Service exports
pub mod cache;
pub mod memory;
pub mod postgres;
pub mod store;

pub use cache::{CacheManager, CacheKey, CacheError, ResponseCache};
pub use memory::MemoryStore;
pub use postgres::PostgresClient;
pub use store::{CatalogStore, ItemStore, PropertyStore, StoreError};
