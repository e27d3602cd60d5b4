use crate::core::error::SearchError;
use crate::models::{BoundingBox, Coordinate, Property};
use geo::{BoundingRect, Coord, LineString};

/// Polygon drawn on the map, closed into a ring
///
/// Coordinates are mapped to planar points with `x = latitude` and
/// `y = longitude`. No geodesic correction is applied.
///
/// # Boundary points
/// Containment uses even-odd ray casting with half-open edges, so a point
/// lying exactly on an edge is assigned to one side by a fixed rule. For an
/// axis-aligned square, points on the low-latitude and low-longitude edges are
/// inside and points on the high edges are outside. The same point is always
/// classified the same way.
#[derive(Debug, Clone)]
pub struct Geofence {
    ring: LineString<f64>,
    bounding_box: BoundingBox,
}

impl Geofence {
    pub fn new(coordinates: &[Coordinate]) -> Result<Self, SearchError> {
        let mut ring: LineString<f64> = coordinates
            .iter()
            .map(|c| Coord { x: c.latitude, y: c.longitude })
            .collect::<Vec<_>>()
            .into();

        let rect = ring.bounding_rect().ok_or(SearchError::EmptyPolygon)?;
        ring.close();

        Ok(Self {
            ring,
            bounding_box: BoundingBox {
                min_lat: rect.min().x,
                max_lat: rect.max().x,
                min_lon: rect.min().y,
                max_lon: rect.max().y,
            },
        })
    }

    /// Smallest box containing every vertex
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    pub fn contains(&self, latitude: f64, longitude: f64) -> bool {
        is_within_bounding_box(latitude, longitude, &self.bounding_box)
            && ring_contains(&self.ring, Coord { x: latitude, y: longitude })
    }

    /// Keep the candidates inside the ring, preserving their order, and cap
    /// the result at `limit`
    pub fn filter(&self, candidates: Vec<Property>, limit: usize) -> Vec<Property> {
        candidates
            .into_iter()
            .filter(|p| self.contains(p.latitude, p.longitude))
            .take(limit)
            .collect()
    }
}

/// Check if a point is within a bounding box, bounds included
#[inline]
pub fn is_within_bounding_box(lat: f64, lon: f64, bbox: &BoundingBox) -> bool {
    lat >= bbox.min_lat && lat <= bbox.max_lat && lon >= bbox.min_lon && lon <= bbox.max_lon
}

/// Even-odd ray casting over a closed ring
///
/// A horizontal ray is cast from `point` towards +x and the edges it crosses
/// are counted. Each edge is treated as half-open in y so a vertex shared by
/// two edges is counted once.
pub fn ring_contains(ring: &LineString<f64>, point: Coord<f64>) -> bool {
    let mut inside = false;
    for line in ring.lines() {
        let (a, b) = (line.start, line.end);
        if (a.y > point.y) != (b.y > point.y) {
            let crossing = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if point.x < crossing {
                inside = !inside;
            }
        }
    }
    inside
}
