//! estate-match - catalog search and matching service
//!
//! Two independent catalogs, items and properties, searched by bucketed
//! facets, by a polygon drawn on the map, and by door-fit recommendation
//! (which properties an item can be carried into).

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{Geofence, Matcher, RangeCatalog, SearchEngine, SearchError, SearchLimits};
pub use crate::models::{Coordinate, Item, ItemSearchParams, Property, PropertySearchParams};
pub use crate::services::{MemoryStore, PostgresClient};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let fence = Geofence::new(&[
            Coordinate { latitude: 0.0, longitude: 0.0 },
            Coordinate { latitude: 0.0, longitude: 1.0 },
            Coordinate { latitude: 1.0, longitude: 1.0 },
        ])
        .unwrap();
        assert!(fence.bounding_box().max_lat > fence.bounding_box().min_lat);
    }
}
