//! Storage-agnostic query vocabulary shared by the search engine and the stores.

use crate::models::{Item, Property};
use std::cmp::Ordering;

/// Columns the engine is allowed to filter on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    PriceRange,
    HeightRange,
    WidthRange,
    DepthRange,
    RentRange,
    DoorHeightRange,
    DoorWidthRange,
    DoorHeight,
    DoorWidth,
    Color,
    Kind,
}

impl Column {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Column::PriceRange => "price_range",
            Column::HeightRange => "height_range",
            Column::WidthRange => "width_range",
            Column::DepthRange => "depth_range",
            Column::RentRange => "rent_range",
            Column::DoorHeightRange => "door_height_range",
            Column::DoorWidthRange => "door_width_range",
            Column::DoorHeight => "door_height",
            Column::DoorWidth => "door_width",
            Column::Color => "color",
            Column::Kind => "kind",
        }
    }
}

/// One conjunct of a [`Predicate`]
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Integer equality, used for bucket columns
    Equals { column: Column, value: i64 },
    /// Categorical equality
    TextEquals { column: Column, value: String },
    /// Integer lower bound, inclusive
    AtLeast { column: Column, value: i64 },
    /// Every listed tag must be present on the row
    TagsContain(Vec<String>),
    /// Remaining stock > 0
    InStock,
}

/// Conjunction of conditions. An empty predicate matches every row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    pub conditions: Vec<Condition>,
}

impl Predicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn push(&mut self, condition: Condition) {
        self.conditions.push(condition);
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Evaluate the predicate against an in-memory row
    pub fn matches<R: CatalogRow>(&self, row: &R) -> bool {
        self.conditions.iter().all(|condition| match condition {
            Condition::Equals { column, value } => row.int_column(*column) == Some(*value),
            Condition::TextEquals { column, value } => {
                row.text_column(*column) == Some(value.as_str())
            }
            Condition::AtLeast { column, value } => {
                row.int_column(*column).is_some_and(|v| v >= *value)
            }
            Condition::TagsContain(tags) => {
                let present = row.tags();
                tags.iter().all(|tag| present.contains(tag))
            }
            Condition::InStock => row.in_stock(),
        })
    }
}

/// Result orderings. Both are total: ties are broken by ascending id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    /// popularity DESC, id ASC
    Popularity,
    /// price (or rent) ASC, id ASC
    LowestPrice,
}

impl OrderBy {
    pub fn compare<R: CatalogRow>(&self, a: &R, b: &R) -> Ordering {
        let primary = match self {
            OrderBy::Popularity => b.popularity().cmp(&a.popularity()),
            OrderBy::LowestPrice => a.price().cmp(&b.price()),
        };
        primary.then_with(|| a.id().cmp(&b.id()))
    }
}

/// Row access needed to filter and rank a catalog entry outside the database
pub trait CatalogRow: Clone + Send + Sync + 'static {
    fn id(&self) -> i64;
    fn popularity(&self) -> i64;
    /// Price for items, rent for properties
    fn price(&self) -> i64;
    fn in_stock(&self) -> bool;
    fn tags(&self) -> &[String];
    fn int_column(&self, column: Column) -> Option<i64>;
    fn text_column(&self, column: Column) -> Option<&str>;
}

impl CatalogRow for Item {
    fn id(&self) -> i64 {
        self.id
    }

    fn popularity(&self) -> i64 {
        self.popularity
    }

    fn price(&self) -> i64 {
        self.price
    }

    fn in_stock(&self) -> bool {
        self.is_available()
    }

    fn tags(&self) -> &[String] {
        &self.features_array
    }

    fn int_column(&self, column: Column) -> Option<i64> {
        match column {
            Column::PriceRange => Some(self.price_range),
            Column::HeightRange => Some(self.height_range),
            Column::WidthRange => Some(self.width_range),
            Column::DepthRange => Some(self.depth_range),
            _ => None,
        }
    }

    fn text_column(&self, column: Column) -> Option<&str> {
        match column {
            Column::Color => Some(&self.color),
            Column::Kind => Some(&self.kind),
            _ => None,
        }
    }
}

impl CatalogRow for Property {
    fn id(&self) -> i64 {
        self.id
    }

    fn popularity(&self) -> i64 {
        self.popularity
    }

    fn price(&self) -> i64 {
        self.rent
    }

    // properties have no stock
    fn in_stock(&self) -> bool {
        true
    }

    fn tags(&self) -> &[String] {
        &self.features_array
    }

    fn int_column(&self, column: Column) -> Option<i64> {
        match column {
            Column::RentRange => Some(self.rent_range),
            Column::DoorHeightRange => Some(self.door_height_range),
            Column::DoorWidthRange => Some(self.door_width_range),
            Column::DoorHeight => Some(self.door_height),
            Column::DoorWidth => Some(self.door_width),
            _ => None,
        }
    }

    fn text_column(&self, _column: Column) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn property(id: i64, popularity: i64, door_width: i64, door_height: i64) -> Property {
        Property {
            id,
            thumbnail: String::new(),
            name: format!("Property {}", id),
            description: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            address: String::new(),
            rent: 50_000,
            door_height,
            door_width,
            features: "pets,balcony".to_string(),
            popularity,
            features_array: vec!["pets".to_string(), "balcony".to_string()],
            rent_range: 1,
            door_height_range: 0,
            door_width_range: 0,
        }
    }

    #[test]
    fn test_empty_predicate_matches_everything() {
        assert!(Predicate::new().matches(&property(1, 1, 10, 10)));
    }

    #[test]
    fn test_tags_contain_is_all_of() {
        let row = property(1, 1, 10, 10);
        let both = Predicate::new().and(Condition::TagsContain(vec![
            "pets".to_string(),
            "balcony".to_string(),
        ]));
        let missing = Predicate::new().and(Condition::TagsContain(vec![
            "pets".to_string(),
            "garden".to_string(),
        ]));

        assert!(both.matches(&row));
        assert!(!missing.matches(&row));
    }

    #[test]
    fn test_at_least_is_inclusive() {
        let row = property(1, 1, 80, 120);
        let fits = Predicate::new()
            .and(Condition::AtLeast { column: Column::DoorWidth, value: 80 })
            .and(Condition::AtLeast { column: Column::DoorHeight, value: 120 });
        let too_tall = Predicate::new()
            .and(Condition::AtLeast { column: Column::DoorHeight, value: 121 });

        assert!(fits.matches(&row));
        assert!(!too_tall.matches(&row));
    }

    #[test]
    fn test_unknown_column_never_matches() {
        let row = property(1, 1, 80, 120);
        let predicate = Predicate::new()
            .and(Condition::TextEquals { column: Column::Color, value: "black".to_string() });
        assert!(!predicate.matches(&row));
    }

    #[test]
    fn test_popularity_order_breaks_ties_by_id() {
        let a = property(2, 10, 0, 0);
        let b = property(1, 10, 0, 0);
        let c = property(3, 20, 0, 0);

        let mut rows = vec![a, b, c];
        rows.sort_by(|x, y| OrderBy::Popularity.compare(x, y));

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }
}
