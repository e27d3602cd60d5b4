//! Range catalog and bucket classifier.
//!
//! Continuous attributes (price, rent, door sizes, ...) are never searched with
//! range scans. Each one is split into a fixed list of half-open buckets and
//! rows carry the bucket index as a plain integer column. The bucket tables
//! come from an external JSON document of the form
//!
//! ```json
//! {
//!   "price": { "prefix": "", "suffix": "円", "ranges": [
//!       { "id": 0, "min": -1,   "max": 3000 },
//!       { "id": 1, "min": 3000, "max": -1 } ] },
//!   "color": { "list": ["black", "white"] }
//! }
//! ```
//!
//! where a bound of `-1` means unbounded on that side.

use crate::core::error::SearchError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use thiserror::Error;

/// Sentinel used by the external table for an open bound
const UNBOUNDED: i64 = -1;

/// Load-time faults in a range table. Always fatal.
#[derive(Debug, Error)]
pub enum RangeCatalogError {
    #[error("Failed to read range catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse range catalog: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Malformed facet {facet}: {reason}")]
    Malformed { facet: String, reason: String },
}

/// Raw bucket as it appears in the external table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub id: i64,
    pub min: i64,
    pub max: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeCondition {
    pub prefix: String,
    pub suffix: String,
    pub ranges: Vec<Range>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListCondition {
    pub list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchCondition {
    Range(RangeCondition),
    List(ListCondition),
}

/// The whole external document, keyed by facet name
pub type ConditionSet = BTreeMap<String, SearchCondition>;

/// Half-open bucket `[min, max)`; `None` is an open side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub id: usize,
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl Bucket {
    pub fn contains(&self, value: i64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value < max)
    }
}

/// Ordered lookup table for one facet
#[derive(Debug, Clone)]
struct FacetTable {
    buckets: Vec<Bucket>,
    // exclusive upper bound of every bucket but the last, ascending
    upper_bounds: Vec<i64>,
}

impl FacetTable {
    fn build(facet: &str, ranges: &[Range]) -> Result<Self, RangeCatalogError> {
        let malformed = |reason: String| RangeCatalogError::Malformed {
            facet: facet.to_string(),
            reason,
        };

        if ranges.is_empty() {
            return Err(malformed("no buckets".to_string()));
        }

        let bound = |v: i64| if v == UNBOUNDED { None } else { Some(v) };
        let mut buckets = Vec::with_capacity(ranges.len());
        let mut upper_bounds = Vec::with_capacity(ranges.len() - 1);

        for (position, range) in ranges.iter().enumerate() {
            if range.id != position as i64 {
                return Err(malformed(format!(
                    "bucket at position {} has id {}",
                    position, range.id
                )));
            }

            let bucket = Bucket {
                id: position,
                min: bound(range.min),
                max: bound(range.max),
            };
            let is_last = position + 1 == ranges.len();

            // together with the last bucket, this makes every i64 classifiable
            if position == 0 && bucket.min.is_some() {
                return Err(malformed("first bucket must be unbounded below".to_string()));
            }

            match (bucket.max, is_last) {
                (None, false) => {
                    return Err(malformed(format!("bucket {} is unbounded but not last", position)))
                }
                (Some(_), true) => {
                    return Err(malformed("last bucket must be unbounded above".to_string()))
                }
                (Some(max), false) => {
                    if bucket.min.is_some_and(|min| min >= max) {
                        return Err(malformed(format!("bucket {} is empty", position)));
                    }
                    upper_bounds.push(max);
                }
                (None, true) => {}
            }

            if let Some(previous) = buckets.last().map(|b: &Bucket| b.max) {
                if bucket.min != previous {
                    return Err(malformed(format!(
                        "gap or overlap between buckets {} and {}",
                        position - 1,
                        position
                    )));
                }
            }

            buckets.push(bucket);
        }

        Ok(Self { buckets, upper_bounds })
    }

    fn classify(&self, value: i64) -> Option<usize> {
        let index = self.upper_bounds.partition_point(|&upper| upper <= value);
        let bucket = self.buckets.get(index)?;
        bucket.contains(value).then_some(bucket.id)
    }
}

/// Immutable, process-wide facet table for one catalog
#[derive(Debug, Clone)]
pub struct RangeCatalog {
    conditions: ConditionSet,
    facets: HashMap<String, FacetTable>,
}

impl RangeCatalog {
    /// Build and validate the lookup tables of every range facet
    pub fn from_conditions(conditions: ConditionSet) -> Result<Self, RangeCatalogError> {
        let mut facets = HashMap::new();
        for (name, condition) in &conditions {
            if let SearchCondition::Range(range) = condition {
                facets.insert(name.clone(), FacetTable::build(name, &range.ranges)?);
            }
        }

        Ok(Self { conditions, facets })
    }

    pub fn from_json(json: &str) -> Result<Self, RangeCatalogError> {
        Self::from_conditions(serde_json::from_str(json)?)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, RangeCatalogError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The document this catalog was built from, for display
    pub fn conditions(&self) -> &ConditionSet {
        &self.conditions
    }

    pub fn bucket_count(&self, facet: &str) -> Result<usize, SearchError> {
        Ok(self.table(facet)?.buckets.len())
    }

    /// Map a raw attribute value to the index of the bucket containing it
    pub fn classify(&self, facet: &str, value: i64) -> Result<usize, SearchError> {
        self.table(facet)?
            .classify(value)
            .ok_or_else(|| SearchError::OutOfRange {
                facet: facet.to_string(),
                value,
            })
    }

    /// Resolve a query-supplied bucket index back to its bounds
    pub fn resolve_bucket(&self, facet: &str, index: i64) -> Result<Bucket, SearchError> {
        let table = self.table(facet)?;
        usize::try_from(index)
            .ok()
            .and_then(|i| table.buckets.get(i))
            .copied()
            .ok_or_else(|| SearchError::InvalidBucketIndex {
                facet: facet.to_string(),
                index,
            })
    }

    fn table(&self, facet: &str) -> Result<&FacetTable, SearchError> {
        self.facets
            .get(facet)
            .ok_or_else(|| SearchError::UnknownFacet(facet.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOOR_WIDTH: &str = r#"{
        "doorWidth": { "prefix": "", "suffix": "cm", "ranges": [
            { "id": 0, "min": -1, "max": 80 },
            { "id": 1, "min": 80, "max": 110 },
            { "id": 2, "min": 110, "max": 150 },
            { "id": 3, "min": 150, "max": -1 }
        ] },
        "feature": { "list": ["pets", "balcony"] }
    }"#;

    fn catalog() -> RangeCatalog {
        RangeCatalog::from_json(DOOR_WIDTH).unwrap()
    }

    #[test]
    fn test_classify_bucket_edges() {
        let catalog = catalog();
        assert_eq!(catalog.classify("doorWidth", 0).unwrap(), 0);
        assert_eq!(catalog.classify("doorWidth", 79).unwrap(), 0);
        assert_eq!(catalog.classify("doorWidth", 80).unwrap(), 1);
        assert_eq!(catalog.classify("doorWidth", 149).unwrap(), 2);
        assert_eq!(catalog.classify("doorWidth", 150).unwrap(), 3);
        assert_eq!(catalog.classify("doorWidth", 10_000).unwrap(), 3);
    }

    #[test]
    fn test_classify_unknown_facet() {
        let err = catalog().classify("rent", 10).unwrap_err();
        assert!(matches!(err, SearchError::UnknownFacet(f) if f == "rent"));
    }

    #[test]
    fn test_list_facet_is_not_a_range() {
        let err = catalog().classify("feature", 1).unwrap_err();
        assert!(matches!(err, SearchError::UnknownFacet(_)));
    }

    #[test]
    fn test_rejects_bounded_first_bucket() {
        let json = r#"{ "price": { "prefix": "", "suffix": "", "ranges": [
            { "id": 0, "min": 0, "max": 100 },
            { "id": 1, "min": 100, "max": -1 }
        ] } }"#;

        let err = RangeCatalog::from_json(json).unwrap_err();
        assert!(matches!(
            err,
            RangeCatalogError::Malformed { facet, reason }
                if facet == "price" && reason.contains("unbounded below")
        ));
    }

    #[test]
    fn test_every_value_is_classifiable() {
        let catalog = catalog();
        for value in [i64::MIN, -1, 0, 80, i64::MAX] {
            assert!(catalog.classify("doorWidth", value).is_ok(), "{} unclassified", value);
        }
    }

    #[test]
    fn test_resolve_bucket() {
        let catalog = catalog();
        let bucket = catalog.resolve_bucket("doorWidth", 1).unwrap();
        assert_eq!(bucket.min, Some(80));
        assert_eq!(bucket.max, Some(110));

        let last = catalog.resolve_bucket("doorWidth", 3).unwrap();
        assert_eq!(last.max, None);

        assert!(matches!(
            catalog.resolve_bucket("doorWidth", 4),
            Err(SearchError::InvalidBucketIndex { index: 4, .. })
        ));
        assert!(matches!(
            catalog.resolve_bucket("doorWidth", -1),
            Err(SearchError::InvalidBucketIndex { index: -1, .. })
        ));
    }

    #[test]
    fn test_classify_then_resolve_brackets_value() {
        let catalog = catalog();
        for value in 0..400 {
            let index = catalog.classify("doorWidth", value).unwrap();
            let bucket = catalog.resolve_bucket("doorWidth", index as i64).unwrap();
            assert!(bucket.contains(value), "{} not in bucket {:?}", value, bucket);
        }
    }

    #[test]
    fn test_rejects_gap() {
        let json = r#"{ "rent": { "prefix": "", "suffix": "", "ranges": [
            { "id": 0, "min": -1, "max": 100 },
            { "id": 1, "min": 120, "max": -1 }
        ] } }"#;
        assert!(matches!(
            RangeCatalog::from_json(json),
            Err(RangeCatalogError::Malformed { .. })
        ));
    }

    #[test]
    fn test_rejects_non_contiguous_ids() {
        let json = r#"{ "rent": { "prefix": "", "suffix": "", "ranges": [
            { "id": 0, "min": -1, "max": 100 },
            { "id": 2, "min": 100, "max": -1 }
        ] } }"#;
        assert!(RangeCatalog::from_json(json).is_err());
    }

    #[test]
    fn test_rejects_bounded_last_bucket() {
        let json = r#"{ "rent": { "prefix": "", "suffix": "", "ranges": [
            { "id": 0, "min": -1, "max": 100 },
            { "id": 1, "min": 100, "max": 200 }
        ] } }"#;
        assert!(RangeCatalog::from_json(json).is_err());
    }

    #[test]
    fn test_conditions_round_trip_for_display() {
        let catalog = catalog();
        let json = serde_json::to_value(catalog.conditions()).unwrap();
        assert_eq!(json["doorWidth"]["ranges"][0]["min"], -1);
        assert_eq!(json["feature"]["list"][1], "balcony");
    }
}
