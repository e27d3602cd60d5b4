use crate::core::ranking::merge_ranked;
use crate::models::{Column, Condition, Item, OrderBy, Predicate, Property};

/// Minimum door opening an item needs under one orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorFit {
    pub min_width: i64,
    pub min_height: i64,
}

impl DoorFit {
    pub fn predicate(&self) -> Predicate {
        Predicate::new()
            .and(Condition::AtLeast { column: Column::DoorWidth, value: self.min_width })
            .and(Condition::AtLeast { column: Column::DoorHeight, value: self.min_height })
    }
}

/// Recommends properties whose door an item can be carried through
///
/// # Pipeline
/// 1. Sort the item's height, width and depth ascending: d1 <= d2 <= d3
/// 2. Derive the two orientations of the two smaller sides; the largest side
///    goes lengthwise through the door and is not constrained
/// 3. Query the property catalog once per orientation, each capped at `limit`
/// 4. Merge both ranked lists, dropping duplicates, and cap again
#[derive(Debug, Clone)]
pub struct Matcher {
    limit: usize,
}

impl Matcher {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Hypothesis A (width >= d1, height >= d2) and B (width >= d2, height >= d1)
    pub fn hypotheses(item: &Item) -> [DoorFit; 2] {
        let [d1, d2, _] = item.sorted_dimensions();
        [
            DoorFit { min_width: d1, min_height: d2 },
            DoorFit { min_width: d2, min_height: d1 },
        ]
    }

    /// Union of the two per-orientation results, popularity DESC then id ASC
    pub fn merge(&self, first: Vec<Property>, second: Vec<Property>) -> Vec<Property> {
        merge_ranked([first, second], OrderBy::Popularity, self.limit)
    }
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new(20)
    }
}
