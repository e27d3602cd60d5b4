// Core algorithm exports
pub mod engine;
pub mod error;
pub mod filters;
pub mod geofence;
pub mod matcher;
pub mod ranges;
pub mod ranking;

pub use engine::{SearchEngine, SearchLimits};
pub use error::SearchError;
pub use filters::{build_item_query, build_property_query, FacetQuery, FilterSpec, Pagination};
pub use geofence::{is_within_bounding_box, ring_contains, Geofence};
pub use matcher::{DoorFit, Matcher};
pub use ranges::{Bucket, ConditionSet, RangeCatalog, RangeCatalogError, SearchCondition};
pub use ranking::{merge_ranked, sort_ranked};
