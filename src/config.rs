//! Configuration: property alias table and per-component settings.
//!
//! Every struct here implements [`Default`] with the values the Monroe, LA
//! crash dataset ships with, and deserializes with `#[serde(default)]` so a
//! TOML file only needs to name what it overrides:
//!
//! ```toml
//! region_suffix = "Ouachita Parish, LA"
//!
//! [aliases]
//! year = ["YR", "YEAR"]
//!
//! [alert]
//! trigger_radius_meters = 150.0
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::drive::AlertConfig;
use crate::heatmap::DensityConfig;
use crate::CrashspotError;

fn aliases(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Ordered property-name variants for every canonical field.
///
/// Resolution walks each list front to back and takes the first value that
/// is present and parses as the field's type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasTable {
    pub id: Vec<String>,
    pub year: Vec<String>,
    pub month: Vec<String>,
    pub hour: Vec<String>,
    pub time: Vec<String>,
    pub date: Vec<String>,
    pub city: Vec<String>,
    pub street: Vec<String>,
    pub location: Vec<String>,
    pub fatalities: Vec<String>,
    pub severity: Vec<String>,
    pub injuries: Vec<String>,
    pub vehicles: Vec<String>,
    pub weather: Vec<String>,
    pub road_condition: Vec<String>,
    /// Score on predicted-risk features
    pub hotspot_score: Vec<String>,
    /// Risk on road segment features
    pub road_risk: Vec<String>,
    pub cluster_radius: Vec<String>,
    pub cluster_count: Vec<String>,
}

impl Default for AliasTable {
    fn default() -> Self {
        Self {
            id: aliases(&["ID", "ST_CASE", "id"]),
            year: aliases(&["YEAR", "CRASH_YEAR", "year"]),
            month: aliases(&["MONTH", "CRASH_MONTH", "month"]),
            hour: aliases(&["HOUR", "CRASH_HOUR", "hour"]),
            time: aliases(&["TIME", "CRASH_TIME", "time"]),
            date: aliases(&["DATE", "CRASH_DATE", "date"]),
            city: aliases(&["CITY", "CITY_NAME", "TOWN", "MUNICIPALITY"]),
            street: aliases(&["ST_NAME", "STREET", "INTDESC", "LOCATION", "INTERSECT"]),
            location: aliases(&["LOCATION", "INTDESC", "ST_NAME", "INTERSECT", "LOC_DESC"]),
            fatalities: aliases(&["FATALS", "fatalities", "DEATHS", "FATAL_COUNT"]),
            severity: aliases(&["MAX_SEV", "MAX_SEVERITY", "INJ_SEV", "SEV", "SEVERITY"]),
            injuries: aliases(&["INJURIES", "PERSONS_INJURED", "INJ_TOTAL", "INJURIES_TOTAL"]),
            vehicles: aliases(&["VE_TOTAL", "VEH_COUNT", "VEHICLES"]),
            weather: aliases(&["WEATHER", "WEATHER1", "WEATHER_DESC"]),
            road_condition: aliases(&["SUR_COND", "ROADCOND", "ROAD_CONDITION"]),
            hotspot_score: aliases(&["risk", "score", "density", "RISK"]),
            road_risk: aliases(&["risk", "RISK", "score", "risk_score"]),
            cluster_radius: aliases(&["radius", "radius_m", "RADIUS"]),
            cluster_count: aliases(&["count", "COUNT", "crash_count"]),
        }
    }
}

/// Top-level configuration for a crash map session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashspotConfig {
    pub aliases: AliasTable,
    /// Appended to street/city when building an address guess.
    pub region_suffix: String,
    pub density: DensityConfig,
    pub alert: AlertConfig,
    /// Number of grouped locations shown in the insights list. Default: 5
    pub top_locations: usize,
    /// Number of ranked hotspots shown on the map. Default: 25
    pub hotspot_display_count: usize,
}

impl Default for CrashspotConfig {
    fn default() -> Self {
        Self {
            aliases: AliasTable::default(),
            region_suffix: "Monroe, LA".to_string(),
            density: DensityConfig::default(),
            alert: AlertConfig::default(),
            top_locations: 5,
            hotspot_display_count: 25,
        }
    }
}

impl CrashspotConfig {
    /// Parse a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, CrashspotError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make a component misbehave.
    pub fn validate(&self) -> Result<(), CrashspotError> {
        let cell = self.density.cell_size_degrees;
        if !(cell.is_finite() && cell > 0.0) {
            return Err(CrashspotError::InvalidConfig {
                message: format!("density.cell_size_degrees must be positive, got {}", cell),
            });
        }
        let radius = self.alert.trigger_radius_meters;
        if !(radius.is_finite() && radius >= 0.0) {
            return Err(CrashspotError::InvalidConfig {
                message: format!("alert.trigger_radius_meters must be non-negative, got {}", radius),
            });
        }
        Ok(())
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self, CrashspotError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::info!("[Config] Loaded {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_is_default() {
        let config = CrashspotConfig::from_toml_str("").unwrap();
        assert_eq!(config, CrashspotConfig::default());
    }

    #[test]
    fn test_partial_alias_override() {
        let config = CrashspotConfig::from_toml_str(
            r#"
            region_suffix = "Ruston, LA"

            [aliases]
            year = ["YR"]

            [alert]
            trigger_radius_meters = 200.0
            "#,
        )
        .unwrap();

        assert_eq!(config.aliases.year, vec!["YR".to_string()]);
        // Untouched lists keep their defaults
        assert_eq!(config.aliases.month, AliasTable::default().month);
        assert_eq!(config.region_suffix, "Ruston, LA");
        assert_eq!(config.alert.trigger_radius_meters, 200.0);
        assert_eq!(config.top_locations, 5);
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(CrashspotConfig::from_toml_str("aliases = 3").is_err());
    }

    #[test]
    fn test_non_positive_cell_size_rejected() {
        for value in ["0.0", "-0.005"] {
            let toml = format!("[density]\ncell_size_degrees = {}\n", value);
            let err = CrashspotConfig::from_toml_str(&toml).unwrap_err();
            assert!(matches!(err, CrashspotError::InvalidConfig { .. }), "{}", value);
        }
        let nan = CrashspotConfig::from_toml_str("[density]\ncell_size_degrees = nan\n");
        assert!(nan.is_err());

        let ok = CrashspotConfig::from_toml_str("[density]\ncell_size_degrees = 0.01\n").unwrap();
        assert_eq!(ok.density.cell_size_degrees, 0.01);
    }

    #[test]
    fn test_negative_trigger_radius_rejected() {
        let err = CrashspotConfig::from_toml_str("[alert]\ntrigger_radius_meters = -5.0\n").unwrap_err();
        assert!(matches!(err, CrashspotError::InvalidConfig { .. }));
    }
}
