use crate::models::{CatalogRow, OrderBy};
use std::collections::HashSet;

/// Sort rows in place by the given total order
pub fn sort_ranked<R: CatalogRow>(rows: &mut [R], order: OrderBy) {
    rows.sort_by(|a, b| order.compare(a, b));
}

/// Union several ranked lists, keeping the first occurrence of each id,
/// re-rank the union and cap it at `limit`
pub fn merge_ranked<R, I>(lists: I, order: OrderBy, limit: usize) -> Vec<R>
where
    R: CatalogRow,
    I: IntoIterator<Item = Vec<R>>,
{
    let mut seen = HashSet::new();
    let mut merged: Vec<R> = lists
        .into_iter()
        .flatten()
        .filter(|row| seen.insert(row.id()))
        .collect();

    sort_ranked(&mut merged, order);
    merged.truncate(limit);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Property;

    fn property(id: i64, popularity: i64, rent: i64) -> Property {
        Property {
            id,
            thumbnail: String::new(),
            name: format!("Property {}", id),
            description: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            address: String::new(),
            rent,
            door_height: 0,
            door_width: 0,
            features: String::new(),
            popularity,
            features_array: vec![],
            rent_range: 0,
            door_height_range: 0,
            door_width_range: 0,
        }
    }

    fn ids(rows: &[Property]) -> Vec<i64> {
        rows.iter().map(|p| p.id).collect()
    }

    #[test]
    fn test_merge_deduplicates_and_reranks() {
        let a = vec![property(1, 90, 0), property(2, 50, 0)];
        let b = vec![property(3, 70, 0), property(1, 90, 0), property(4, 50, 0)];

        let merged = merge_ranked([a, b], OrderBy::Popularity, 10);
        assert_eq!(ids(&merged), vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_merge_caps_after_ranking() {
        let a = vec![property(5, 10, 0)];
        let b = vec![property(6, 99, 0), property(7, 98, 0)];

        let merged = merge_ranked([a, b], OrderBy::Popularity, 2);
        assert_eq!(ids(&merged), vec![6, 7]);
    }

    #[test]
    fn test_lowest_price_order() {
        let mut rows = vec![property(3, 0, 500), property(1, 0, 700), property(2, 0, 500)];
        sort_ranked(&mut rows, OrderBy::LowestPrice);
        assert_eq!(ids(&rows), vec![2, 3, 1]);
    }
}
