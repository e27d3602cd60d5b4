use serde::{Deserialize, Serialize};

/// Movable catalog item (a chair, a sofa, ...)
///
/// Popularity, stock and the derived bucket columns are internal and never
/// part of the public JSON representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub thumbnail: String,
    pub price: i64,
    pub height: i64,
    pub width: i64,
    pub depth: i64,
    pub color: String,
    pub features: String,
    pub kind: String,
    #[serde(skip_serializing, default)]
    pub popularity: i64,
    #[serde(skip_serializing, default)]
    pub stock: i64,
    #[serde(skip, default)]
    pub features_array: Vec<String>,
    #[serde(skip, default)]
    pub price_range: i64,
    #[serde(skip, default)]
    pub height_range: i64,
    #[serde(skip, default)]
    pub width_range: i64,
    #[serde(skip, default)]
    pub depth_range: i64,
}

impl Item {
    /// A sold out item stays in the catalog but is hidden from every lookup
    pub fn is_available(&self) -> bool {
        self.stock > 0
    }

    /// Physical dimensions sorted ascending
    pub fn sorted_dimensions(&self) -> [i64; 3] {
        let mut dims = [self.height, self.width, self.depth];
        dims.sort_unstable();
        dims
    }
}

/// Fixed real estate property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Property {
    pub id: i64,
    pub thumbnail: String,
    pub name: String,
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub rent: i64,
    #[serde(rename = "doorHeight")]
    pub door_height: i64,
    #[serde(rename = "doorWidth")]
    pub door_width: i64,
    pub features: String,
    #[serde(skip_serializing, default)]
    pub popularity: i64,
    #[serde(skip, default)]
    pub features_array: Vec<String>,
    #[serde(skip, default)]
    pub rent_range: i64,
    #[serde(skip, default)]
    pub door_height_range: i64,
    #[serde(skip, default)]
    pub door_width_range: i64,
}

/// A single polygon vertex or property position.
///
/// Latitude is always the first axis and longitude the second, in the
/// bounding box, in the box query and in the ring test alike.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// Geospatial bounding box, inclusive on every side
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Split a comma separated feature string into its tags
pub fn split_features(features: &str) -> Vec<String> {
    features
        .split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}
