use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::models::domain::Coordinate;

/// Faceted item search, as received on the query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemSearchParams {
    #[serde(rename = "priceRangeId", default, deserialize_with = "empty_as_none")]
    pub price_range_id: Option<i64>,
    #[serde(rename = "heightRangeId", default, deserialize_with = "empty_as_none")]
    pub height_range_id: Option<i64>,
    #[serde(rename = "widthRangeId", default, deserialize_with = "empty_as_none")]
    pub width_range_id: Option<i64>,
    #[serde(rename = "depthRangeId", default, deserialize_with = "empty_as_none")]
    pub depth_range_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub color: Option<String>,
    /// Comma separated list of required tags
    #[serde(default, deserialize_with = "empty_as_none")]
    pub features: Option<String>,
    pub page: i64,
    #[serde(rename = "perPage")]
    pub per_page: i64,
}

/// Faceted property search, as received on the query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertySearchParams {
    #[serde(rename = "rentRangeId", default, deserialize_with = "empty_as_none")]
    pub rent_range_id: Option<i64>,
    #[serde(rename = "doorHeightRangeId", default, deserialize_with = "empty_as_none")]
    pub door_height_range_id: Option<i64>,
    #[serde(rename = "doorWidthRangeId", default, deserialize_with = "empty_as_none")]
    pub door_width_range_id: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub features: Option<String>,
    pub page: i64,
    #[serde(rename = "perPage")]
    pub per_page: i64,
}

/// Polygon drawn by the user on the map
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatesRequest {
    pub coordinates: Vec<Coordinate>,
}

/// Body of a purchase or document request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(email)]
    pub email: String,
}

/// Item row as supplied to the import endpoint, before bucketing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ItemRecord {
    pub id: i64,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 0))]
    pub height: i64,
    #[validate(range(min = 0))]
    pub width: i64,
    #[validate(range(min = 0))]
    pub depth: i64,
    pub color: String,
    #[serde(default)]
    pub features: String,
    pub kind: String,
    #[serde(default)]
    pub popularity: i64,
    #[validate(range(min = 0))]
    pub stock: i64,
}

/// Property row as supplied to the import endpoint, before bucketing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PropertyRecord {
    pub id: i64,
    #[validate(length(min = 1))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub thumbnail: String,
    #[serde(default)]
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    #[validate(range(min = 0))]
    pub rent: i64,
    #[serde(rename = "doorHeight")]
    #[validate(range(min = 0))]
    pub door_height: i64,
    #[serde(rename = "doorWidth")]
    #[validate(range(min = 0))]
    pub door_width: i64,
    #[serde(default)]
    pub features: String,
    #[serde(default)]
    pub popularity: i64,
}

/// Treat a missing or blank query parameter as absent
fn empty_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}
