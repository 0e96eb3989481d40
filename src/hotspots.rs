//! Hotspot ranking from the predicted-risk layer.
//!
//! Risk features arrive as points, polygons or multi-polygons. Each yields
//! one or more candidate locations (polygons contribute their outer-ring
//! centroid) carrying the feature's score, and the candidates are ranked by
//! descending score. Equal scores keep their source order.

use geo::{Coord, LineString};
use geojson::{Feature, Value as Geometry};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::geo_utils::{coordinate_key, ring_centroid};
use crate::normalize::Properties;
use crate::{AliasTable, GeoPoint};

/// A ranked hotspot location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotspotCandidate {
    pub position: GeoPoint,
    /// Risk score, higher is riskier. Missing or non-finite scores are 0.
    pub score: f64,
}

impl HotspotCandidate {
    pub fn new(position: GeoPoint, score: f64) -> Self {
        Self { position, score }
    }

    /// Identity used to debounce alerts: position to 5 decimals.
    pub fn key(&self) -> String {
        coordinate_key(&self.position, 5)
    }
}

/// Convert a GeoJSON ring into a `geo` line string, skipping short positions.
fn ring_to_line_string(ring: &[Vec<f64>]) -> LineString<f64> {
    ring.iter()
        .filter_map(|p| match p.as_slice() {
            [x, y, ..] => Some(Coord { x: *x, y: *y }),
            _ => None,
        })
        .collect::<Vec<_>>()
        .into()
}

/// Centroid of a polygon's outer ring. Holes are ignored.
fn polygon_location(rings: &[Vec<Vec<f64>>]) -> Option<GeoPoint> {
    let outer = rings.first()?;
    let c = ring_centroid(&ring_to_line_string(outer))?;
    Some(GeoPoint::new(c.y, c.x))
}

/// Candidate locations for one feature's geometry.
fn feature_locations(feature: &Feature) -> Vec<GeoPoint> {
    match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Geometry::Point(coords)) => GeoPoint::from_position(coords).into_iter().collect(),
        Some(Geometry::Polygon(rings)) => polygon_location(rings).into_iter().collect(),
        Some(Geometry::MultiPolygon(polygons)) => {
            polygons.iter().filter_map(|p| polygon_location(p)).collect()
        }
        _ => Vec::new(),
    }
}

/// Extract and rank hotspot candidates from risk features.
///
/// Ordering is by descending score and stable on ties.
pub fn rank_hotspots(features: &[Feature], aliases: &AliasTable) -> Vec<HotspotCandidate> {
    let mut candidates: Vec<HotspotCandidate> = features
        .iter()
        .flat_map(|f| {
            let score = Properties::of(f).float(&aliases.hotspot_score).unwrap_or(0.0);
            feature_locations(f)
                .into_iter()
                .map(move |position| HotspotCandidate::new(position, score))
        })
        .collect();

    candidates.sort_by(|a, b| b.score.total_cmp(&a.score));

    debug!(
        "[Hotspots] Ranked {} candidates from {} features",
        candidates.len(),
        features.len()
    );
    candidates
}

/// The `n` highest-ranked hotspots.
pub fn top_hotspots(ranked: &[HotspotCandidate], n: usize) -> &[HotspotCandidate] {
    &ranked[..n.min(ranked.len())]
}
