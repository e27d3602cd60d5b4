use serde::{Deserialize, Serialize};
use crate::models::domain::{Item, Property};

/// Paginated item search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSearchResponse {
    pub count: i64,
    pub items: Vec<Item>,
}

/// Paginated or polygon property search result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertySearchResponse {
    pub count: i64,
    pub properties: Vec<Property>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemListResponse {
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyListResponse {
    pub properties: Vec<Property>,
}

/// Outcome of a successful purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub id: i64,
    pub remaining: i64,
}

/// Outcome of a bulk import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportResponse {
    pub imported: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResponse {
    pub status: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
