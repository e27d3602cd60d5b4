use crate::services::StoreError;
use thiserror::Error;

/// Errors surfaced by the search engine to its callers
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Unknown facet: {0}")]
    UnknownFacet(String),

    #[error("Value {value} is outside every bucket of facet {facet}")]
    OutOfRange { facet: String, value: i64 },

    #[error("Invalid bucket index {index} for facet {facet}")]
    InvalidBucketIndex { facet: String, index: i64 },

    #[error("No search condition specified")]
    NoFilterSpecified,

    #[error("Invalid pagination: page={page}, perPage={per_page}")]
    InvalidPagination { page: i64, per_page: i64 },

    #[error("Polygon has no coordinates")]
    EmptyPolygon,

    #[error("Item not found: {0}")]
    ItemNotFound(i64),

    #[error("Property not found: {0}")]
    PropertyNotFound(i64),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),
}

impl SearchError {
    /// Stable machine-readable name used in error responses
    pub fn kind(&self) -> &'static str {
        match self {
            SearchError::UnknownFacet(_) => "unknown_facet",
            SearchError::OutOfRange { .. } => "out_of_range",
            SearchError::InvalidBucketIndex { .. } => "invalid_bucket_index",
            SearchError::NoFilterSpecified => "no_filter_specified",
            SearchError::InvalidPagination { .. } => "invalid_pagination",
            SearchError::EmptyPolygon => "empty_polygon",
            SearchError::ItemNotFound(_) => "item_not_found",
            SearchError::PropertyNotFound(_) => "property_not_found",
            SearchError::Validation(_) => "validation_failed",
            SearchError::StoreUnavailable(_) => "store_unavailable",
        }
    }
}
