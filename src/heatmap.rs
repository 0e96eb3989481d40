//! Crash density grid.
//!
//! Buckets crash positions into a sparse grid of fixed-size cells (0.005°,
//! roughly 500 m), counting records per cell. Counts are normalized against
//! the busiest cell and bucketed into four tiers; the tier and intensity
//! drive the circle fill and radius drawn by the map layer, so they are part
//! of the output contract.
//!
//! The grid is re-derived from the current filtered set on every pass.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::layers::Rgba;
use crate::{CrashRecord, GeoPoint};

/// Configuration for density grid generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Grid cell size in degrees (default: 0.005, ~500m)
    pub cell_size_degrees: f64,
    /// Optional bounds to limit computation to a viewport
    pub bounds: Option<DensityBounds>,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            cell_size_degrees: 0.005,
            bounds: None,
        }
    }
}

/// Bounding box for density computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl DensityBounds {
    fn contains(&self, p: &GeoPoint) -> bool {
        p.latitude >= self.min_lat
            && p.latitude <= self.max_lat
            && p.longitude >= self.min_lng
            && p.longitude <= self.max_lng
    }
}

/// Intensity tier of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DensityTier {
    /// t < 0.25
    Low,
    /// 0.25 <= t < 0.5
    Moderate,
    /// 0.5 <= t < 0.75
    High,
    /// t >= 0.75
    Severe,
}

impl DensityTier {
    pub fn from_intensity(t: f64) -> Self {
        if t < 0.25 {
            DensityTier::Low
        } else if t < 0.5 {
            DensityTier::Moderate
        } else if t < 0.75 {
            DensityTier::High
        } else {
            DensityTier::Severe
        }
    }

    /// Fill color for a cell of this tier at intensity `t`.
    ///
    /// Opacity grows with intensity from a per-tier base.
    pub fn fill(&self, t: f64) -> Rgba {
        let (r, g, b, base) = match self {
            DensityTier::Low => (31, 184, 205, 0.25),
            DensityTier::Moderate => (52, 211, 153, 0.3),
            DensityTier::High => (251, 191, 36, 0.35),
            DensityTier::Severe => (239, 68, 68, 0.4),
        };
        Rgba { r, g, b, a: base + t * 0.4 }
    }
}

/// A single non-empty cell in the density grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityCell {
    /// floor(lat / cell size)
    pub row: i64,
    /// floor(lng / cell size)
    pub col: i64,
    /// Cell center for rendering
    pub center: GeoPoint,
    /// Records in this cell
    pub count: u32,
    /// count / max count, in (0, 1]
    pub intensity: f64,
    pub tier: DensityTier,
    pub fill: Rgba,
    /// Circle radius in meters: 150 + 200·intensity
    pub radius_meters: f64,
}

/// Complete density grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityGrid {
    /// Non-empty cells only, ordered by (row, col)
    pub cells: Vec<DensityCell>,
    pub cell_size_degrees: f64,
    /// Count of the busiest cell (0 when empty)
    pub max_count: u32,
    /// Sum of all cell counts
    pub total_count: u32,
}

impl DensityGrid {
    /// Find the cell containing a location, if any records fell there.
    pub fn cell_at(&self, lat: f64, lng: f64) -> Option<&DensityCell> {
        let (row, col) = cell_coords(lat, lng, self.cell_size_degrees);
        self.cells.iter().find(|c| c.row == row && c.col == col)
    }

    /// Cells sorted by descending count, densest first.
    pub fn densest(&self, n: usize) -> Vec<&DensityCell> {
        let mut cells: Vec<&DensityCell> = self.cells.iter().collect();
        cells.sort_by(|a, b| b.count.cmp(&a.count));
        cells.truncate(n);
        cells
    }
}

/// Grid coordinate
type CellCoord = (i64, i64);

fn cell_coords(lat: f64, lng: f64, cell_size: f64) -> CellCoord {
    (
        (lat / cell_size).floor() as i64,
        (lng / cell_size).floor() as i64,
    )
}

/// Density grid builder
struct DensityGridBuilder {
    cell_size: f64,
    cells: BTreeMap<CellCoord, u32>,
}

impl DensityGridBuilder {
    fn new(cell_size: f64) -> Self {
        Self {
            cell_size,
            cells: BTreeMap::new(),
        }
    }

    fn add_point(&mut self, p: &GeoPoint) {
        let key = cell_coords(p.latitude, p.longitude, self.cell_size);
        *self.cells.entry(key).or_insert(0) += 1;
    }

    /// Get cell center coordinates
    fn cell_center(&self, row: i64, col: i64) -> GeoPoint {
        let s = self.cell_size;
        GeoPoint::new(row as f64 * s + s / 2.0, col as f64 * s + s / 2.0)
    }

    fn build(self) -> DensityGrid {
        let max_count = self.cells.values().copied().max().unwrap_or(0);
        let total_count = self.cells.values().sum();

        let cells = self
            .cells
            .iter()
            .map(|(&(row, col), &count)| {
                let intensity = count as f64 / max_count as f64;
                let tier = DensityTier::from_intensity(intensity);
                DensityCell {
                    row,
                    col,
                    center: self.cell_center(row, col),
                    count,
                    intensity,
                    tier,
                    fill: tier.fill(intensity),
                    radius_meters: 150.0 + 200.0 * intensity,
                }
            })
            .collect();

        DensityGrid {
            cells,
            cell_size_degrees: self.cell_size,
            max_count,
            total_count,
        }
    }
}

/// Generate a density grid from crash records
///
/// A cell size that is not a positive number falls back to the default.
pub fn generate_density_grid(records: &[CrashRecord], config: &DensityConfig) -> DensityGrid {
    let cell_size = if config.cell_size_degrees.is_finite() && config.cell_size_degrees > 0.0 {
        config.cell_size_degrees
    } else {
        let fallback = DensityConfig::default().cell_size_degrees;
        log::warn!(
            "[Density] Invalid cell size {}, using {}",
            config.cell_size_degrees,
            fallback
        );
        fallback
    };
    let mut grid = DensityGridBuilder::new(cell_size);

    for record in records {
        if let Some(bounds) = &config.bounds {
            if !bounds.contains(&record.position) {
                continue;
            }
        }
        grid.add_point(&record.position);
    }

    let grid = grid.build();
    log::debug!(
        "[Density] {} records into {} cells (max {})",
        grid.total_count,
        grid.cells.len(),
        grid.max_count
    );
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Severity;

    fn record_at(lat: f64, lng: f64) -> CrashRecord {
        CrashRecord {
            id: format!("{},{}", lat, lng),
            position: GeoPoint::new(lat, lng),
            year: None,
            month: None,
            hour: None,
            weekday: "—".to_string(),
            is_weekend: false,
            is_night: false,
            severity: Severity::PropertyDamageOnly,
            injury_count: 0,
            vehicle_count: 1,
            location: "—".to_string(),
            weather: "Unknown".to_string(),
            road_condition: "Unknown".to_string(),
            address_guess: String::new(),
            date_text: None,
            time_text: None,
            raw: Default::default(),
        }
    }

    #[test]
    fn test_empty_grid() {
        let grid = generate_density_grid(&[], &DensityConfig::default());
        assert!(grid.cells.is_empty());
        assert_eq!(grid.max_count, 0);
        assert_eq!(grid.total_count, 0);
    }

    #[test]
    fn test_same_position_same_cell_and_totals() {
        let records = vec![
            record_at(32.5093, -92.1193),
            record_at(32.5093, -92.1193),
            record_at(32.5094, -92.1192),
            record_at(32.5400, -92.0800),
        ];
        let grid = generate_density_grid(&records, &DensityConfig::default());

        assert_eq!(grid.total_count, 4);
        assert_eq!(grid.cells.iter().map(|c| c.count).sum::<u32>(), 4);

        let cell = grid.cell_at(32.5093, -92.1193).unwrap();
        assert_eq!(cell.count, 3);
        assert_eq!(cell.intensity, 1.0);
        assert_eq!(cell.tier, DensityTier::Severe);
        assert_eq!(cell.radius_meters, 350.0);
    }

    #[test]
    fn test_cell_center_is_lower_corner_plus_half() {
        let grid = generate_density_grid(&[record_at(32.5093, -92.1193)], &DensityConfig::default());
        let cell = &grid.cells[0];
        // floor(32.5093 / 0.005) * 0.005 = 32.505 ; floor(-92.1193 / 0.005) * 0.005 = -92.12
        assert!((cell.center.latitude - 32.5075).abs() < 1e-9);
        assert!((cell.center.longitude - (-92.1175)).abs() < 1e-9);
    }

    #[test]
    fn test_tier_thresholds() {
        assert_eq!(DensityTier::from_intensity(0.1), DensityTier::Low);
        assert_eq!(DensityTier::from_intensity(0.25), DensityTier::Moderate);
        assert_eq!(DensityTier::from_intensity(0.5), DensityTier::High);
        assert_eq!(DensityTier::from_intensity(0.74), DensityTier::High);
        assert_eq!(DensityTier::from_intensity(0.75), DensityTier::Severe);
        assert_eq!(DensityTier::from_intensity(1.0), DensityTier::Severe);
    }

    #[test]
    fn test_intensity_normalized_to_busiest_cell() {
        let mut records = vec![record_at(32.5093, -92.1193); 4];
        records.push(record_at(32.5600, -92.0500));
        let grid = generate_density_grid(&records, &DensityConfig::default());

        let sparse = grid.cell_at(32.5600, -92.0500).unwrap();
        assert_eq!(sparse.intensity, 0.25);
        assert_eq!(sparse.tier, DensityTier::Moderate);
        assert!((sparse.fill.a - 0.4).abs() < 1e-9);
        assert_eq!(grid.densest(1)[0].count, 4);
    }

    #[test]
    fn test_bounds_limit_computation() {
        let records = vec![record_at(32.5093, -92.1193), record_at(40.0, -75.0)];
        let config = DensityConfig {
            bounds: Some(DensityBounds { min_lat: 32.0, max_lat: 33.0, min_lng: -93.0, max_lng: -92.0 }),
            ..DensityConfig::default()
        };
        let grid = generate_density_grid(&records, &config);
        assert_eq!(grid.total_count, 1);
    }
    #[test]
    fn test_non_positive_cell_size_uses_default() {
        let records = vec![record_at(32.5093, -92.1193), record_at(32.5094, -92.1192)];
        for cell_size_degrees in [0.0, -0.01, f64::NAN] {
            let config = DensityConfig { cell_size_degrees, ..DensityConfig::default() };
            let grid = generate_density_grid(&records, &config);
            assert_eq!(grid.cell_size_degrees, 0.005);
            assert_eq!(grid.cells.len(), 1);
            assert_eq!(grid.cells[0].count, 2);
        }
    }
}
