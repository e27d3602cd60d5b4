use crate::core::error::SearchError;
use crate::core::ranges::RangeCatalog;
use crate::models::{
    split_features, Column, Condition, ItemSearchParams, Predicate, PropertySearchParams,
};

/// Facets of the item catalog: (facet name in the range catalog, bucket column)
pub const ITEM_FACETS: [(&str, Column); 4] = [
    ("price", Column::PriceRange),
    ("height", Column::HeightRange),
    ("width", Column::WidthRange),
    ("depth", Column::DepthRange),
];

/// Facets of the property catalog
pub const PROPERTY_FACETS: [(&str, Column); 3] = [
    ("rent", Column::RentRange),
    ("doorHeight", Column::DoorHeightRange),
    ("doorWidth", Column::DoorWidthRange),
];

/// Catalog-independent description of a faceted search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    /// (facet name, bucket column, bucket index)
    pub buckets: Vec<(&'static str, Column, i64)>,
    pub equals: Vec<(Column, String)>,
    pub tags: Option<Vec<String>>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty() && self.equals.is_empty() && self.tags.is_none()
    }

    /// Validate every bucket index and turn the filter into a store predicate
    pub fn into_predicate(self, ranges: &RangeCatalog) -> Result<Predicate, SearchError> {
        if self.is_empty() {
            return Err(SearchError::NoFilterSpecified);
        }

        let mut predicate = Predicate::new();
        for (facet, column, index) in self.buckets {
            ranges.resolve_bucket(facet, index)?;
            predicate.push(Condition::Equals { column, value: index });
        }
        for (column, value) in self.equals {
            predicate.push(Condition::TextEquals { column, value });
        }
        if let Some(tags) = self.tags {
            predicate.push(Condition::TagsContain(tags));
        }

        Ok(predicate)
    }
}

/// Zero-based page of a ranked result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    /// Offset is `page * per_page`, with the page size taken exactly as requested
    pub fn new(page: i64, per_page: i64) -> Result<Self, SearchError> {
        if page < 0 || per_page < 0 {
            return Err(SearchError::InvalidPagination { page, per_page });
        }

        let offset = page
            .checked_mul(per_page)
            .ok_or(SearchError::InvalidPagination { page, per_page })?;

        Ok(Self { limit: per_page, offset })
    }
}

/// Predicate plus page, ready for the store
#[derive(Debug, Clone, PartialEq)]
pub struct FacetQuery {
    pub predicate: Predicate,
    pub pagination: Pagination,
}

fn tag_filter(features: Option<&str>) -> Option<Vec<String>> {
    features.map(split_features).filter(|tags| !tags.is_empty())
}

impl ItemSearchParams {
    pub fn filter_spec(&self) -> FilterSpec {
        let ids = [
            self.price_range_id,
            self.height_range_id,
            self.width_range_id,
            self.depth_range_id,
        ];
        let buckets = ITEM_FACETS
            .iter()
            .zip(ids)
            .filter_map(|(&(facet, column), id)| id.map(|id| (facet, column, id)))
            .collect();

        let mut equals = Vec::new();
        if let Some(kind) = &self.kind {
            equals.push((Column::Kind, kind.clone()));
        }
        if let Some(color) = &self.color {
            equals.push((Column::Color, color.clone()));
        }

        FilterSpec {
            buckets,
            equals,
            tags: tag_filter(self.features.as_deref()),
        }
    }
}

impl PropertySearchParams {
    pub fn filter_spec(&self) -> FilterSpec {
        let ids = [
            self.rent_range_id,
            self.door_height_range_id,
            self.door_width_range_id,
        ];
        let buckets = PROPERTY_FACETS
            .iter()
            .zip(ids)
            .filter_map(|(&(facet, column), id)| id.map(|id| (facet, column, id)))
            .collect();

        FilterSpec {
            buckets,
            equals: Vec::new(),
            tags: tag_filter(self.features.as_deref()),
        }
    }
}

/// Build the item search query. Sold out items are always excluded.
pub fn build_item_query(
    params: &ItemSearchParams,
    ranges: &RangeCatalog,
) -> Result<FacetQuery, SearchError> {
    let mut predicate = params.filter_spec().into_predicate(ranges)?;
    predicate.push(Condition::InStock);
    let pagination = Pagination::new(params.page, params.per_page)?;

    Ok(FacetQuery { predicate, pagination })
}

/// Build the property search query
pub fn build_property_query(
    params: &PropertySearchParams,
    ranges: &RangeCatalog,
) -> Result<FacetQuery, SearchError> {
    let predicate = params.filter_spec().into_predicate(ranges)?;
    let pagination = Pagination::new(params.page, params.per_page)?;

    Ok(FacetQuery { predicate, pagination })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranges() -> RangeCatalog {
        RangeCatalog::from_json(
            r#"{
                "price": { "prefix": "", "suffix": "", "ranges": [
                    { "id": 0, "min": -1, "max": 3000 },
                    { "id": 1, "min": 3000, "max": -1 } ] },
                "height": { "prefix": "", "suffix": "", "ranges": [
                    { "id": 0, "min": -1, "max": 80 },
                    { "id": 1, "min": 80, "max": -1 } ] },
                "width": { "prefix": "", "suffix": "", "ranges": [
                    { "id": 0, "min": -1, "max": 80 },
                    { "id": 1, "min": 80, "max": -1 } ] },
                "depth": { "prefix": "", "suffix": "", "ranges": [
                    { "id": 0, "min": -1, "max": 80 },
                    { "id": 1, "min": 80, "max": -1 } ] }
            }"#,
        )
        .unwrap()
    }

    fn params() -> ItemSearchParams {
        ItemSearchParams {
            page: 0,
            per_page: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_no_filter_specified() {
        let err = build_item_query(&params(), &ranges()).unwrap_err();
        assert!(matches!(err, SearchError::NoFilterSpecified));
    }

    #[test]
    fn test_blank_features_is_no_filter() {
        let mut p = params();
        p.features = Some(" , ".to_string());
        assert!(matches!(
            build_item_query(&p, &ranges()),
            Err(SearchError::NoFilterSpecified)
        ));
    }

    #[test]
    fn test_item_query_appends_in_stock() {
        let mut p = params();
        p.price_range_id = Some(1);
        p.color = Some("black".to_string());

        let query = build_item_query(&p, &ranges()).unwrap();
        assert_eq!(
            query.predicate.conditions,
            vec![
                Condition::Equals { column: Column::PriceRange, value: 1 },
                Condition::TextEquals { column: Column::Color, value: "black".to_string() },
                Condition::InStock,
            ]
        );
    }

    #[test]
    fn test_invalid_bucket_index_rejected() {
        let mut p = params();
        p.depth_range_id = Some(2);
        assert!(matches!(
            build_item_query(&p, &ranges()),
            Err(SearchError::InvalidBucketIndex { index: 2, .. })
        ));
    }

    #[test]
    fn test_pagination_offset() {
        let page = Pagination::new(3, 25).unwrap();
        assert_eq!(page, Pagination { limit: 25, offset: 75 });

        let large = Pagination::new(1, 200).unwrap();
        assert_eq!(large, Pagination { limit: 200, offset: 200 });
    }

    #[test]
    fn test_pagination_offset_overflow_rejected() {
        assert!(matches!(
            Pagination::new(i64::MAX, 2),
            Err(SearchError::InvalidPagination { .. })
        ));
    }

    #[test]
    fn test_negative_pagination_rejected() {
        assert!(matches!(
            Pagination::new(-1, 10),
            Err(SearchError::InvalidPagination { page: -1, .. })
        ));
        assert!(Pagination::new(0, -10).is_err());
    }

    #[test]
    fn test_property_spec_has_no_categorical_filters() {
        let p = PropertySearchParams {
            door_width_range_id: Some(1),
            features: Some("pets,balcony".to_string()),
            page: 0,
            per_page: 5,
            ..Default::default()
        };
        let spec = p.filter_spec();

        assert_eq!(spec.buckets, vec![("doorWidth", Column::DoorWidthRange, 1)]);
        assert!(spec.equals.is_empty());
        assert_eq!(spec.tags, Some(vec!["pets".to_string(), "balcony".to_string()]));
    }
}
