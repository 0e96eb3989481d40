//! # Crashspot
//!
//! Crash geodata normalization, density aggregation, hotspot ranking and
//! drive-mode proximity alerts.
//!
//! This library provides:
//! - Normalization of crash GeoJSON with inconsistent property schemas
//! - Filtering, density grids and top-location grouping for insights
//! - Ranking of predicted-risk points and polygons into hotspots
//! - A debounced proximity-alert engine for live position streams
//! - Cached reverse geocoding of displayed locations
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel normalization with rayon
//! - **`http`** - Enable the Nominatim reverse geocoder
//! - **`cli`** - Build the `crashspot` command line tool
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use crashspot::{CrashFilter, CrashMapState, CrashspotConfig};
//!
//! let crashes = r#"{
//!     "type": "FeatureCollection",
//!     "features": [
//!         { "type": "Feature",
//!           "geometry": { "type": "Point", "coordinates": [-92.1193, 32.5093] },
//!           "properties": { "YEAR": 2022, "MONTH": 6, "HOUR": 19, "FATALS": 1 } }
//!     ]
//! }"#;
//!
//! let mut state = CrashMapState::new(CrashspotConfig::default());
//! state.load_crashes_str(crashes).unwrap();
//!
//! let fatal = CrashFilter { fatal_only: true, ..CrashFilter::default() };
//! assert_eq!(state.apply_filter(fatal).len(), 1);
//!
//! let summary = state.insights();
//! assert_eq!(summary.fatal, 1);
//! assert_eq!(summary.peak_hour, Some(19));
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod address;
pub mod config;
pub mod drive;
pub mod error;
pub mod filter;
pub mod geo_utils;
pub mod heatmap;
pub mod hotspots;
pub mod insights;
pub mod layers;
pub mod normalize;
pub mod state;

// Nominatim client for reverse geocoding
#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub use http::NominatimGeocoder;

pub use address::{
    AddressCache, AddressResolver, JsonFileAddressCache, MemoryAddressCache, ReverseGeocoder,
    DEFAULT_CACHE_CAPACITY,
};
pub use config::{AliasTable, CrashspotConfig};
pub use drive::{
    AlertConfig, DriveEvent, DriveSession, DriveStatus, ErrorPolicy, PositionEvent,
    ProximityAlert, ProximityAlertEngine,
};
pub use error::CrashspotError;
pub use filter::{apply_filter, CrashFilter};
pub use heatmap::{generate_density_grid, DensityCell, DensityConfig, DensityGrid, DensityTier};
pub use hotspots::{rank_hotspots, top_hotspots, HotspotCandidate};
pub use insights::{group_top_locations, summarize, InsightSummary, TopLocation};
pub use layers::{ClusterMarker, LayerPaths, LayerSet, RoadSegment, Rgba};
pub use normalize::{normalize_collection, normalize_feature, RecordNormalizer};
pub use state::CrashMapState;

// ============================================================================
// Core Types
// ============================================================================

/// A WGS84 coordinate with latitude and longitude in degrees.
///
/// # Example
/// ```
/// use crashspot::GeoPoint;
/// let point = GeoPoint::new(32.5093, -92.1193); // Monroe, LA
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }

    /// Build a point from a GeoJSON position (`[lng, lat, ...]`).
    pub fn from_position(position: &[f64]) -> Option<Self> {
        match position {
            [lng, lat, ..] => Some(Self::new(*lat, *lng)),
            _ => None,
        }
    }
}

/// Crash severity.
///
/// Ordered by increasing severity so `max()` and sorting pick the worst
/// outcome first when reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    PropertyDamageOnly,
    MinorInjury,
    SeriousInjury,
    Fatal,
}

impl Severity {
    /// Display label used by the map legend.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Fatal => "Fatal",
            Severity::SeriousInjury => "Serious Injury",
            Severity::MinorInjury => "Minor Injury",
            Severity::PropertyDamageOnly => "Property Damage Only",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A crash event in canonical form.
///
/// Built once per source feature by [`RecordNormalizer`] and never mutated
/// afterwards. Only features with a usable point geometry become records, so
/// `position` is always valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrashRecord {
    /// Source id, or a sequential id assigned during the load
    pub id: String,
    pub position: GeoPoint,
    pub year: Option<i32>,
    /// 1-12
    pub month: Option<u32>,
    /// 0-23
    pub hour: Option<u32>,
    /// Full day name, or "—" when the date is unknown
    pub weekday: String,
    pub is_weekend: bool,
    /// Hour in 18-23 or 0-6
    pub is_night: bool,
    pub severity: Severity,
    pub injury_count: u32,
    /// Always at least 1
    pub vehicle_count: u32,
    /// Best-effort location description
    pub location: String,
    pub weather: String,
    pub road_condition: String,
    /// Street, city and region joined with ", "
    pub address_guess: String,
    /// Raw date text as found in the source
    pub date_text: Option<String>,
    /// Raw time text as found in the source
    pub time_text: Option<String>,
    /// Original feature properties
    pub raw: serde_json::Map<String, serde_json::Value>,
}

impl CrashRecord {
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(32.5093, -92.1193).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 181.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn test_from_position_uses_geojson_axis_order() {
        let p = GeoPoint::from_position(&[-92.1193, 32.5093]).unwrap();
        assert_eq!(p.latitude, 32.5093);
        assert_eq!(p.longitude, -92.1193);
        assert!(GeoPoint::from_position(&[1.0]).is_none());
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::PropertyDamageOnly < Severity::MinorInjury);
        assert!(Severity::MinorInjury < Severity::SeriousInjury);
        assert!(Severity::SeriousInjury < Severity::Fatal);
        assert_eq!(Severity::SeriousInjury.to_string(), "Serious Injury");
    }
}
