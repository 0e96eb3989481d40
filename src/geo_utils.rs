//! # Geographic Utilities
//!
//! Geographic computations shared by the aggregation, ranking and drive-mode
//! modules.
//!
//! ## Overview
//!
//! | Function | Description |
//! |----------|-------------|
//! | [`haversine_distance`] | Great-circle distance between two points |
//! | [`meters_to_degrees`] | Convert meters to approximate degrees at a latitude |
//! | [`ring_centroid`] | Signed-area centroid of a polygon ring |
//! | [`coordinate_key`] | Rounded `"lat,lng"` key used for grouping and caching |
//!
//! ## Example
//!
//! ```rust
//! use crashspot::{GeoPoint, geo_utils};
//!
//! let a = GeoPoint::new(32.5093, -92.1193);
//! let b = GeoPoint::new(32.5103, -92.1193);
//!
//! let dist = geo_utils::haversine_distance(&a, &b);
//! assert!((dist - 111.2).abs() < 1.0);
//!
//! assert_eq!(geo_utils::coordinate_key(&a, 5), "32.50930,-92.11930");
//! ```
//!
//! ## Coordinate System
//!
//! All functions expect WGS84 coordinates (latitude/longitude in degrees).
//! Polygon rings follow GeoJSON axis order: `x` is longitude, `y` is latitude.

use geo::{Coord, LineString};

use crate::GeoPoint;

/// Spherical Earth radius used for all distance checks, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

// =============================================================================
// Distance Functions
// =============================================================================

/// Great-circle distance between two points using the Haversine formula.
///
/// Uses a spherical Earth of radius [`EARTH_RADIUS_METERS`]. Identical points
/// return exactly `0.0`.
///
/// # Example
///
/// ```rust
/// use crashspot::{GeoPoint, geo_utils};
///
/// let p = GeoPoint::new(32.5093, -92.1193);
/// assert_eq!(geo_utils::haversine_distance(&p, &p), 0.0);
/// ```
#[inline]
pub fn haversine_distance(p1: &GeoPoint, p2: &GeoPoint) -> f64 {
    let lat1 = p1.latitude.to_radians();
    let lat2 = p2.latitude.to_radians();
    let d_lat = (p2.latitude - p1.latitude).to_radians();
    let d_lng = (p2.longitude - p1.longitude).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Convert meters to approximate degrees at a given latitude.
///
/// Returns a single value suitable for square search envelopes. The
/// longitude shrink factor is floored at 0.1 so the result stays bounded
/// near the poles.
#[inline]
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let lat_rad = latitude.to_radians();
    let meters_per_degree = 111_320.0 * lat_rad.cos().max(0.1);
    meters / meters_per_degree
}

// =============================================================================
// Centroid Functions
// =============================================================================

/// Compute the centroid of a polygon ring with the shoelace formula.
///
/// For consecutive vertices `(x_j, y_j)` → `(x_i, y_i)` (wrapping from the
/// last vertex back to the first) the cross term is
/// `f_i = x_j·y_i − x_i·y_j`, the signed area is `A = Σf_i / 2` and the
/// centroid is `(Σ(x_j + x_i)·f_i, Σ(y_j + y_i)·f_i) / 6A`.
///
/// Works for closed (first == last) and open rings alike since the
/// duplicated closing edge contributes nothing. Degenerate rings with zero
/// area return their first vertex. Returns `None` for an empty ring.
///
/// # Example
///
/// ```rust
/// use crashspot::geo_utils::ring_centroid;
/// use geo::LineString;
///
/// let square = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
/// let c = ring_centroid(&square).unwrap();
/// assert_eq!((c.x, c.y), (0.5, 0.5));
/// ```
pub fn ring_centroid(ring: &LineString<f64>) -> Option<Coord<f64>> {
    let coords = &ring.0;
    let first = *coords.first()?;

    let mut area = 0.0;
    let mut cx = 0.0;
    let mut cy = 0.0;

    let mut j = coords.len() - 1;
    for i in 0..coords.len() {
        let prev = coords[j];
        let cur = coords[i];
        let f = prev.x * cur.y - cur.x * prev.y;
        area += f;
        cx += (prev.x + cur.x) * f;
        cy += (prev.y + cur.y) * f;
        j = i;
    }
    area *= 0.5;

    if area == 0.0 || !area.is_finite() {
        return Some(first);
    }

    Some(Coord {
        x: cx / (6.0 * area),
        y: cy / (6.0 * area),
    })
}

// =============================================================================
// Keys
// =============================================================================

/// Format a point as `"lat,lng"` with `decimals` fractional digits.
///
/// Five decimals (~1 m) identify hotspots and address cache entries; four
/// decimals (~11 m) group crash locations.
pub fn coordinate_key(point: &GeoPoint, decimals: usize) -> String {
    format!(
        "{:.*},{:.*}",
        decimals, point.latitude, decimals, point.longitude
    )
}

// =============================================================================
// Unit Tests
// =============================================================================
