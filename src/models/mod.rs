// Model exports
pub mod domain;
pub mod query;
pub mod requests;
pub mod responses;

pub use domain::{Item, Property, Coordinate, BoundingBox, split_features};
pub use query::{CatalogRow, Column, Condition, OrderBy, Predicate};
pub use requests::{ItemSearchParams, PropertySearchParams, CoordinatesRequest, ContactRequest, ItemRecord, PropertyRecord};
pub use responses::{
    ItemSearchResponse, PropertySearchResponse, ItemListResponse, PropertyListResponse,
    PurchaseResponse, ImportResponse, InitializeResponse, HealthResponse, ErrorResponse,
};
