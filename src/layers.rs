//! GeoJSON layer loading.
//!
//! Four files feed the map: crashes, precomputed clusters, road segments
//! scored by risk, and the predicted-risk layer that produces hotspots. The
//! crash layer is required. The three secondary layers load independently:
//! a missing or malformed file is logged and yields an empty layer without
//! affecting the others.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use geojson::{Feature, FeatureCollection, GeoJson, Value as Geometry};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::hotspots::{rank_hotspots, HotspotCandidate};
use crate::normalize::{normalize_collection, Properties};
use crate::{AliasTable, CrashRecord, CrashspotConfig, CrashspotError, GeoPoint};

/// An RGBA color with 0-255 channels and a 0-1 alpha.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    /// CSS `rgba(...)` notation.
    pub fn to_css(&self) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

// ============================================================================
// Reading
// ============================================================================

/// Parse a GeoJSON document that must be a FeatureCollection.
pub fn parse_feature_collection(text: &str) -> Result<FeatureCollection, CrashspotError> {
    match GeoJson::from_str(text)? {
        GeoJson::FeatureCollection(fc) => Ok(fc),
        GeoJson::Feature(_) => Err(CrashspotError::NotFeatureCollection { found: "Feature" }),
        GeoJson::Geometry(_) => Err(CrashspotError::NotFeatureCollection { found: "Geometry" }),
    }
}

/// Read and parse a FeatureCollection file.
pub fn read_feature_collection(path: &Path) -> Result<FeatureCollection, CrashspotError> {
    let text = std::fs::read_to_string(path)?;
    parse_feature_collection(&text)
}

// ============================================================================
// Clusters
// ============================================================================

/// A precomputed crash cluster drawn as a circle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMarker {
    pub position: GeoPoint,
    /// Default: 150
    pub radius_meters: f64,
    pub crash_count: u32,
}

/// Extract cluster markers from Point features; other geometries are skipped.
pub fn parse_clusters(collection: &FeatureCollection, aliases: &AliasTable) -> Vec<ClusterMarker> {
    collection
        .features
        .iter()
        .filter_map(|f| {
            let position = match f.geometry.as_ref().map(|g| &g.value) {
                Some(Geometry::Point(coords)) => GeoPoint::from_position(coords)?,
                _ => return None,
            };
            let props = Properties::of(f);
            Some(ClusterMarker {
                position,
                radius_meters: props
                    .float(&aliases.cluster_radius)
                    .filter(|r| *r != 0.0)
                    .unwrap_or(150.0),
                crash_count: props
                    .int(&aliases.cluster_count)
                    .and_then(|c| u32::try_from(c).ok())
                    .unwrap_or(0),
            })
        })
        .collect()
}

// ============================================================================
// Road segments
// ============================================================================

/// A road segment colored by its risk score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadSegment {
    /// One polyline for a LineString, several for a MultiLineString
    pub lines: Vec<Vec<GeoPoint>>,
    /// Score as found in the source
    pub risk: f64,
    pub color: Rgba,
    /// Stroke weight in pixels
    pub weight: f64,
}

/// Color ramp from green (risk 0) to red (risk 1). Out-of-range risk clamps.
pub fn road_risk_color(risk: f64) -> Rgba {
    let t = risk.clamp(0.0, 1.0);
    Rgba {
        r: (255.0 * t).round() as u8,
        g: (120.0 * (1.0 - t)).round() as u8,
        b: 0,
        a: 0.9,
    }
}

/// Stroke weight for a road segment: max(3, 1 + 6·t).
pub fn road_risk_weight(risk: f64) -> f64 {
    (1.0 + 6.0 * risk.clamp(0.0, 1.0)).max(3.0)
}

fn polyline(coords: &[Vec<f64>]) -> Vec<GeoPoint> {
    coords.iter().filter_map(|c| GeoPoint::from_position(c)).collect()
}

/// Extract road segments from LineString and MultiLineString features.
pub fn parse_roads(collection: &FeatureCollection, aliases: &AliasTable) -> Vec<RoadSegment> {
    collection
        .features
        .iter()
        .filter_map(|f| road_segment(f, aliases))
        .collect()
}

fn road_segment(feature: &Feature, aliases: &AliasTable) -> Option<RoadSegment> {
    let lines = match feature.geometry.as_ref().map(|g| &g.value) {
        Some(Geometry::LineString(coords)) => vec![polyline(coords)],
        Some(Geometry::MultiLineString(parts)) => parts.iter().map(|p| polyline(p)).collect(),
        _ => return None,
    };
    let risk = Properties::of(feature).float(&aliases.road_risk).unwrap_or(0.0);
    Some(RoadSegment {
        lines,
        risk,
        color: road_risk_color(risk),
        weight: road_risk_weight(risk),
    })
}

// ============================================================================
// Layer set
// ============================================================================

/// Locations of the four input files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerPaths {
    pub crashes: PathBuf,
    pub clusters: Option<PathBuf>,
    pub roads: Option<PathBuf>,
    pub risk: Option<PathBuf>,
}

impl LayerPaths {
    /// The standard file names inside `dir`.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            crashes: dir.join("fars_monroe_2021_2022_2023_clean.geojson"),
            clusters: Some(dir.join("fars_monroe_clusters.geojson")),
            roads: Some(dir.join("road_segments_risk.geojson")),
            risk: Some(dir.join("predicted_crash_risk.geojson")),
        }
    }
}

/// Everything loaded from one set of input files.
#[derive(Debug, Clone, Default)]
pub struct LayerSet {
    pub crashes: Vec<CrashRecord>,
    pub clusters: Vec<ClusterMarker>,
    pub roads: Vec<RoadSegment>,
    /// Full ranked hotspot list
    pub hotspots: Vec<HotspotCandidate>,
}

impl LayerSet {
    /// Load all layers. Only a crash layer failure is an error.
    pub fn load(paths: &LayerPaths, config: &CrashspotConfig) -> Result<Self, CrashspotError> {
        let crashes = normalize_collection(&read_feature_collection(&paths.crashes)?, config);
        let aliases = &config.aliases;

        let clusters = load_secondary("clusters", paths.clusters.as_deref(), |fc| {
            parse_clusters(fc, aliases)
        });
        let roads = load_secondary("roads", paths.roads.as_deref(), |fc| parse_roads(fc, aliases));
        let hotspots = load_secondary("risk", paths.risk.as_deref(), |fc| {
            rank_hotspots(&fc.features, aliases)
        });

        info!(
            "[Layers] Loaded {} crashes, {} clusters, {} road segments, {} hotspots",
            crashes.len(),
            clusters.len(),
            roads.len(),
            hotspots.len()
        );

        Ok(Self {
            crashes,
            clusters,
            roads,
            hotspots,
        })
    }
}

/// Load an optional layer, degrading to empty on any failure.
fn load_secondary<T>(
    name: &str,
    path: Option<&Path>,
    parse: impl FnOnce(&FeatureCollection) -> Vec<T>,
) -> Vec<T> {
    let Some(path) = path else {
        return Vec::new();
    };
    match read_feature_collection(path) {
        Ok(fc) => parse(&fc),
        Err(e) => {
            warn!("[Layers] {} layer unavailable ({}): {}", name, path.display(), e);
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn collection(value: serde_json::Value) -> FeatureCollection {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_parse_rejects_non_collection() {
        let point = r#"{ "type": "Point", "coordinates": [1.0, 2.0] }"#;
        assert!(matches!(
            parse_feature_collection(point),
            Err(CrashspotError::NotFeatureCollection { found: "Geometry" })
        ));
        assert!(parse_feature_collection("not json").is_err());
    }

    #[test]
    fn test_road_color_ramp() {
        assert_eq!(road_risk_color(0.0), Rgba { r: 0, g: 120, b: 0, a: 0.9 });
        assert_eq!(road_risk_color(1.0), Rgba { r: 255, g: 0, b: 0, a: 0.9 });
        assert_eq!(road_risk_color(0.5), Rgba { r: 128, g: 60, b: 0, a: 0.9 });
        // Clamped
        assert_eq!(road_risk_color(3.0), road_risk_color(1.0));
        assert_eq!(road_risk_color(-1.0), road_risk_color(0.0));
        assert_eq!(road_risk_color(1.0).to_css(), "rgba(255,0,0,0.9)");
    }

    #[test]
    fn test_road_weight() {
        assert_eq!(road_risk_weight(0.0), 3.0);
        assert_eq!(road_risk_weight(1.0), 7.0);
    }

    #[test]
    fn test_parse_roads() {
        let fc = collection(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature",
                  "geometry": { "type": "LineString", "coordinates": [[-92.1, 32.5], [-92.2, 32.6]] },
                  "properties": { "risk_score": 0.8 } },
                { "type": "Feature",
                  "geometry": { "type": "MultiLineString", "coordinates": [[[-92.1, 32.5], [-92.2, 32.6]], [[-92.3, 32.7], [-92.4, 32.8]]] },
                  "properties": {} },
                { "type": "Feature",
                  "geometry": { "type": "Point", "coordinates": [-92.1, 32.5] },
                  "properties": { "risk": 1.0 } }
            ]
        }));
        let roads = parse_roads(&fc, &AliasTable::default());
        assert_eq!(roads.len(), 2);
        assert_eq!(roads[0].risk, 0.8);
        assert_eq!(roads[0].lines[0][1], GeoPoint::new(32.6, -92.2));
        assert_eq!(roads[1].lines.len(), 2);
        assert_eq!(roads[1].risk, 0.0);
    }

    #[test]
    fn test_parse_clusters_defaults() {
        let fc = collection(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature",
                  "geometry": { "type": "Point", "coordinates": [-92.1, 32.5] },
                  "properties": { "radius_m": 300, "crash_count": 12 } },
                { "type": "Feature",
                  "geometry": { "type": "Point", "coordinates": [-92.2, 32.6] },
                  "properties": null },
                { "type": "Feature",
                  "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] },
                  "properties": {} }
            ]
        }));
        let clusters = parse_clusters(&fc, &AliasTable::default());
        assert_eq!(clusters.len(), 2);
        assert_eq!(clusters[0].radius_meters, 300.0);
        assert_eq!(clusters[0].crash_count, 12);
        assert_eq!(clusters[1].radius_meters, 150.0);
        assert_eq!(clusters[1].crash_count, 0);
    }

    #[test]
    fn test_secondary_layer_failure_is_empty() {
        let missing = Path::new("/nonexistent/crashspot/clusters.geojson");
        let clusters: Vec<ClusterMarker> =
            load_secondary("clusters", Some(missing), |fc| parse_clusters(fc, &AliasTable::default()));
        assert!(clusters.is_empty());
    }
}
