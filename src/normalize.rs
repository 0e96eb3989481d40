//! Crash record normalization.
//!
//! Source files disagree on property names (`YEAR` vs `CRASH_YEAR`), on
//! types (numbers vs numeric strings) and on which fields exist at all.
//! Each canonical field is resolved through its ordered alias list in the
//! [`AliasTable`]: the first value that is present and parses as the field's
//! type wins, otherwise the field's default applies.
//!
//! Normalization never fails. A feature without a usable point geometry is
//! skipped; everything else becomes a [`CrashRecord`].

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc, Weekday};
use geojson::{feature::Id, Feature, FeatureCollection, JsonObject, Value as Geometry};
use log::{debug, info};
use regex::Regex;
use serde_json::Value;

use crate::{AliasTable, CrashRecord, CrashspotConfig, GeoPoint, Severity};

/// Placeholder for unknown descriptive fields.
pub const UNKNOWN_TEXT: &str = "Unknown";
/// Placeholder for an unknown weekday or location.
pub const NO_VALUE: &str = "—";

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("digit run pattern is valid"));
static CLOCK_HOUR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d{1,2}").expect("clock hour pattern is valid"));

// ============================================================================
// Typed value parsing
// ============================================================================

/// Parse an integer from a JSON number or numeric string.
///
/// Fractional values are truncated. Empty strings, booleans, arrays and
/// objects do not parse.
pub fn parse_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
            })
        }
        _ => None,
    }
}

/// Parse a finite float from a JSON number or numeric string.
pub fn parse_float(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

/// Parse display text from a string, number or boolean.
///
/// Strings are trimmed and empty strings do not parse. Integral floats print
/// without a fractional part so a code of `1.0` reads as `"1"`.
pub fn parse_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(i.to_string())
            } else if let Some(u) = n.as_u64() {
                Some(u.to_string())
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
                    Some((f as i64).to_string())
                } else {
                    Some(f.to_string())
                }
            }
        }
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse an explicit hour field: the first digit run, if it is 0-23.
pub fn parse_hour_field(value: &Value) -> Option<u32> {
    let text = parse_text(value)?;
    let digits = DIGIT_RUN.find(&text)?;
    digits.as_str().parse::<u32>().ok().filter(|h| *h <= 23)
}

/// Extract the hour from free-form time text like `"1430"` or `"7:05 PM"`.
///
/// Takes the first one- or two-digit number and clamps it to 0-23.
pub fn parse_hour_from_time(text: &str) -> Option<u32> {
    let m = CLOCK_HOUR.find(text)?;
    m.as_str().parse::<u32>().ok().map(|h| h.min(23))
}

/// Parse a calendar date from a string or epoch-milliseconds number.
pub fn parse_date(value: &Value) -> Option<NaiveDate> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        Value::String(s) => parse_date_text(s.trim()),
        _ => None,
    }
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.date());
        }
    }
    for fmt in ["%Y-%m-%d", "%m/%d/%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    None
}

// ============================================================================
// Alias resolution
// ============================================================================

/// Read-only view over a feature's property map.
#[derive(Debug, Clone, Copy)]
pub struct Properties<'a>(Option<&'a JsonObject>);

impl<'a> Properties<'a> {
    pub fn new(map: Option<&'a JsonObject>) -> Self {
        Self(map)
    }

    pub fn of(feature: &'a Feature) -> Self {
        Self(feature.properties.as_ref())
    }

    /// Raw value for a single key; JSON `null` counts as absent.
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.0?.get(key).filter(|v| !v.is_null())
    }

    /// First alias whose value is present and parses.
    pub fn first<T>(&self, aliases: &[String], parse: impl Fn(&Value) -> Option<T>) -> Option<T> {
        aliases
            .iter()
            .filter_map(|key| self.get(key))
            .find_map(parse)
    }

    pub fn text(&self, aliases: &[String]) -> Option<String> {
        self.first(aliases, parse_text)
    }

    pub fn int(&self, aliases: &[String]) -> Option<i64> {
        self.first(aliases, parse_int)
    }

    pub fn float(&self, aliases: &[String]) -> Option<f64> {
        self.first(aliases, parse_float)
    }
}

// ============================================================================
// Severity
// ============================================================================

fn severity_from_code(text: &str) -> Option<Severity> {
    let v = text.trim().to_lowercase();
    if v.contains("fatal") || v == "1" {
        Some(Severity::Fatal)
    } else if v.contains("serious") || v.contains("severe") || v == "2" {
        Some(Severity::SeriousInjury)
    } else if v.contains("minor") || v.contains("possible") || v == "3" || v == "4" {
        Some(Severity::MinorInjury)
    } else {
        None
    }
}

/// Infer severity from partial data. First matching rule wins:
///
/// 1. a positive fatality count is always Fatal
/// 2. a recognizable severity code or text
/// 3. any injuries make it a Minor Injury
/// 4. otherwise Property Damage Only
pub fn infer_severity(fatalities: i64, severity_code: Option<&str>, injuries: i64) -> Severity {
    if fatalities > 0 {
        return Severity::Fatal;
    }
    if let Some(severity) = severity_code.and_then(severity_from_code) {
        return severity;
    }
    if injuries > 0 {
        Severity::MinorInjury
    } else {
        Severity::PropertyDamageOnly
    }
}

// ============================================================================
// Normalizer
// ============================================================================

/// Converts raw crash features into [`CrashRecord`]s using an alias table.
#[derive(Debug, Clone)]
pub struct RecordNormalizer<'a> {
    aliases: &'a AliasTable,
    region_suffix: &'a str,
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(config: &'a CrashspotConfig) -> Self {
        Self {
            aliases: &config.aliases,
            region_suffix: &config.region_suffix,
        }
    }

    pub fn with_aliases(aliases: &'a AliasTable, region_suffix: &'a str) -> Self {
        Self { aliases, region_suffix }
    }

    /// Normalize one feature.
    ///
    /// `sequence` is the 1-based position of the feature in its collection;
    /// it becomes the id when neither the properties nor the feature carry
    /// one. Returns `None` for features without a valid Point geometry.
    pub fn normalize(&self, feature: &Feature, sequence: usize) -> Option<CrashRecord> {
        let position = match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Geometry::Point(coords)) => GeoPoint::from_position(coords)?,
            other => {
                debug!(
                    "[Normalize] Skipping feature #{} with non-point geometry: {}",
                    sequence,
                    other.map_or("none", geometry_type)
                );
                return None;
            }
        };
        if !position.is_valid() {
            debug!("[Normalize] Skipping feature #{} with invalid position {:?}", sequence, position);
            return None;
        }

        let a = self.aliases;
        let props = Properties::of(feature);

        let date_value = a.date.iter().find_map(|k| props.get(k));
        let date = date_value.and_then(parse_date);

        let year = props
            .int(&a.year)
            .and_then(|y| i32::try_from(y).ok())
            .or_else(|| date.map(|d| d.year()));
        let month = props
            .first(&a.month, |v| parse_int(v).filter(|m| (1..=12).contains(m)))
            .map(|m| m as u32)
            .or_else(|| date.map(|d| d.month()));

        let time_text = props.text(&a.time);
        let hour = props
            .first(&a.hour, parse_hour_field)
            .or_else(|| time_text.as_deref().and_then(parse_hour_from_time));

        let (weekday, is_weekend) = match date {
            Some(d) => (
                d.format("%A").to_string(),
                matches!(d.weekday(), Weekday::Sat | Weekday::Sun),
            ),
            None => (NO_VALUE.to_string(), false),
        };
        let is_night = hour.is_some_and(|h| h >= 18 || h <= 6);

        let street = props.text(&a.street);
        let city = props.text(&a.city);
        let address_guess = [street.as_deref(), city.as_deref(), Some(self.region_suffix)]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        let location = props.text(&a.location).unwrap_or_else(|| {
            if address_guess.is_empty() {
                NO_VALUE.to_string()
            } else {
                address_guess.clone()
            }
        });

        let injuries = props.int(&a.injuries).unwrap_or(0).max(0);
        let vehicles = props.int(&a.vehicles).filter(|v| *v > 0).unwrap_or(1);
        let fatalities = props.int(&a.fatalities).unwrap_or(0);
        let severity_code = props.text(&a.severity);
        let severity = infer_severity(fatalities, severity_code.as_deref(), injuries);

        let id = props
            .text(&a.id)
            .or_else(|| feature.id.as_ref().map(feature_id_text))
            .unwrap_or_else(|| sequence.to_string());

        Some(CrashRecord {
            id,
            position,
            year,
            month,
            hour,
            weekday,
            is_weekend,
            is_night,
            severity,
            injury_count: u32::try_from(injuries).unwrap_or(u32::MAX),
            vehicle_count: u32::try_from(vehicles).unwrap_or(u32::MAX),
            location,
            weather: props.text(&a.weather).unwrap_or_else(|| UNKNOWN_TEXT.to_string()),
            road_condition: props
                .text(&a.road_condition)
                .unwrap_or_else(|| UNKNOWN_TEXT.to_string()),
            address_guess,
            date_text: date_value.and_then(parse_text),
            time_text,
            raw: feature.properties.clone().unwrap_or_default(),
        })
    }
}

/// GeoJSON type name of a geometry, for log messages.
pub(crate) fn geometry_type(value: &Geometry) -> &'static str {
    match value {
        Geometry::Point(_) => "Point",
        Geometry::MultiPoint(_) => "MultiPoint",
        Geometry::LineString(_) => "LineString",
        Geometry::MultiLineString(_) => "MultiLineString",
        Geometry::Polygon(_) => "Polygon",
        Geometry::MultiPolygon(_) => "MultiPolygon",
        Geometry::GeometryCollection(_) => "GeometryCollection",
    }
}

fn feature_id_text(id: &Id) -> String {
    match id {
        Id::String(s) => s.clone(),
        Id::Number(n) => n.to_string(),
    }
}

/// Normalize a single feature with the given configuration.
pub fn normalize_feature(
    feature: &Feature,
    sequence: usize,
    config: &CrashspotConfig,
) -> Option<CrashRecord> {
    RecordNormalizer::new(config).normalize(feature, sequence)
}

/// Normalize every feature of a collection, dropping unusable ones.
///
/// Output order follows input order.
pub fn normalize_collection(
    collection: &FeatureCollection,
    config: &CrashspotConfig,
) -> Vec<CrashRecord> {
    let normalizer = RecordNormalizer::new(config);
    let records: Vec<CrashRecord> = collection
        .features
        .iter()
        .enumerate()
        .filter_map(|(i, f)| normalizer.normalize(f, i + 1))
        .collect();

    log_kept(records.len(), collection.features.len());
    records
}

/// Parallel variant of [`normalize_collection`]. Same output, same order.
#[cfg(feature = "parallel")]
pub fn normalize_collection_parallel(
    collection: &FeatureCollection,
    config: &CrashspotConfig,
) -> Vec<CrashRecord> {
    use rayon::prelude::*;

    let normalizer = RecordNormalizer::new(config);
    let records: Vec<CrashRecord> = collection
        .features
        .par_iter()
        .enumerate()
        .filter_map(|(i, f)| normalizer.normalize(f, i + 1))
        .collect();

    log_kept(records.len(), collection.features.len());
    records
}

fn log_kept(kept: usize, total: usize) {
    info!(
        "[Normalize] Kept {} of {} features ({} dropped)",
        kept,
        total,
        total - kept
    );
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(geometry: Value, properties: Value) -> Feature {
        serde_json::from_value(json!({
            "type": "Feature",
            "geometry": geometry,
            "properties": properties,
        }))
        .unwrap()
    }

    fn point_feature(properties: Value) -> Feature {
        feature(json!({ "type": "Point", "coordinates": [-92.1193, 32.5093] }), properties)
    }

    fn normalize(properties: Value) -> CrashRecord {
        normalize_feature(&point_feature(properties), 1, &CrashspotConfig::default()).unwrap()
    }

    #[test]
    fn test_point_feature_defaults() {
        let record = normalize(json!({}));
        assert_eq!(record.id, "1");
        assert_eq!(record.position, GeoPoint::new(32.5093, -92.1193));
        assert_eq!(record.year, None);
        assert_eq!(record.month, None);
        assert_eq!(record.hour, None);
        assert_eq!(record.weekday, "—");
        assert!(!record.is_weekend);
        assert!(!record.is_night);
        assert_eq!(record.severity, Severity::PropertyDamageOnly);
        assert_eq!(record.injury_count, 0);
        assert_eq!(record.vehicle_count, 1);
        assert_eq!(record.weather, "Unknown");
        assert_eq!(record.road_condition, "Unknown");
        assert_eq!(record.address_guess, "Monroe, LA");
        assert_eq!(record.location, "Monroe, LA");
    }

    #[test]
    fn test_non_point_geometry_is_skipped() {
        let config = CrashspotConfig::default();
        let line = feature(
            json!({ "type": "LineString", "coordinates": [[-92.1, 32.5], [-92.2, 32.6]] }),
            json!({ "YEAR": 2022 }),
        );
        assert!(normalize_feature(&line, 1, &config).is_none());

        let no_geometry: Feature = serde_json::from_value(json!({
            "type": "Feature", "geometry": null, "properties": {}
        }))
        .unwrap();
        assert!(normalize_feature(&no_geometry, 2, &config).is_none());
    }

    #[test]
    fn test_collection_never_grows() {
        let collection: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [-92.1, 32.5] }, "properties": {} },
                { "type": "Feature", "geometry": { "type": "Polygon", "coordinates": [[[0,0],[1,0],[1,1],[0,0]]] }, "properties": {} },
                { "type": "Feature", "geometry": { "type": "Point", "coordinates": [-92.2, 32.6] }, "properties": { "ID": "A7" } }
            ]
        }))
        .unwrap();

        let records = normalize_collection(&collection, &CrashspotConfig::default());
        assert_eq!(records.len(), 2);
        assert!(records.len() <= collection.features.len());
        // Fallback ids follow the feature's position in the collection
        assert_eq!(records[0].id, "1");
        assert_eq!(records[1].id, "A7");
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn test_parallel_matches_serial() {
        let features: Vec<Value> = (0..200)
            .map(|i| match i % 4 {
                0 => json!({ "type": "Feature",
                             "geometry": { "type": "LineString", "coordinates": [[-92.1, 32.5], [-92.2, 32.6]] },
                             "properties": { "YEAR": 2022 } }),
                1 => json!({ "type": "Feature",
                             "geometry": { "type": "Point", "coordinates": [-92.1 - i as f64 * 1e-3, 32.5] },
                             "properties": { "ST_CASE": format!("C{}", i), "HOUR": i % 24 } }),
                _ => json!({ "type": "Feature",
                             "geometry": { "type": "Point", "coordinates": [-92.1, 32.5 + i as f64 * 1e-3] },
                             "properties": { "FATALS": i % 3, "DATE": "2022-06-18" } }),
            })
            .collect();
        let collection: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": features,
        }))
        .unwrap();
        let config = CrashspotConfig::default();

        let serial = normalize_collection(&collection, &config);
        let parallel = normalize_collection_parallel(&collection, &config);
        assert_eq!(serial.len(), 150);
        assert_eq!(parallel, serial);
        // Fallback ids keep the source position
        assert_eq!(parallel[1].id, "3");
        assert_eq!(parallel[0].id, "C1");
    }

    #[test]
    fn test_alias_order_and_numeric_strings() {
        let record = normalize(json!({
            "CRASH_YEAR": "2021",
            "year": 1999,
            "MONTH": null,
            "CRASH_MONTH": "6",
            "VE_TOTAL": "3",
            "PERSONS_INJURED": 2,
        }));
        assert_eq!(record.year, Some(2021));
        assert_eq!(record.month, Some(6));
        assert_eq!(record.vehicle_count, 3);
        assert_eq!(record.injury_count, 2);
    }

    #[test]
    fn test_unparseable_alias_falls_through() {
        let record = normalize(json!({ "YEAR": "n/a", "CRASH_YEAR": 2023, "MONTH": 14, "month": 2 }));
        assert_eq!(record.year, Some(2023));
        assert_eq!(record.month, Some(2));
    }

    #[test]
    fn test_zero_vehicles_defaults_to_one() {
        assert_eq!(normalize(json!({ "VE_TOTAL": 0 })).vehicle_count, 1);
    }

    #[test]
    fn test_hour_prefers_explicit_field() {
        let record = normalize(json!({ "HOUR": "19", "TIME": "0730" }));
        assert_eq!(record.hour, Some(19));
        assert!(record.is_night);
    }

    #[test]
    fn test_hour_from_time_text() {
        assert_eq!(normalize(json!({ "CRASH_TIME": "1430" })).hour, Some(14));
        assert_eq!(normalize(json!({ "time": "7:05 PM" })).hour, Some(7));
        // Clamped into the valid range
        assert_eq!(normalize(json!({ "TIME": "99:99" })).hour, Some(23));
        assert_eq!(normalize(json!({ "TIME": "unknown" })).hour, None);
    }

    #[test]
    fn test_unknown_hour_code_is_null() {
        let record = normalize(json!({ "HOUR": 99 }));
        assert_eq!(record.hour, None);
        assert!(!record.is_night);
    }

    #[test]
    fn test_night_boundaries() {
        for (hour, night) in [(0, true), (6, true), (7, false), (17, false), (18, true), (23, true)] {
            assert_eq!(normalize(json!({ "HOUR": hour })).is_night, night, "hour {}", hour);
        }
    }

    #[test]
    fn test_fatality_count_overrides_severity_code() {
        let record = normalize(json!({ "FATALS": 1, "MAX_SEV": "Minor Injury", "INJURIES": 0 }));
        assert_eq!(record.severity, Severity::Fatal);
    }

    #[test]
    fn test_severity_codes_and_text() {
        assert_eq!(normalize(json!({ "MAX_SEV": 1 })).severity, Severity::Fatal);
        assert_eq!(normalize(json!({ "SEV": "2" })).severity, Severity::SeriousInjury);
        assert_eq!(
            normalize(json!({ "SEVERITY": "Suspected Serious Injury" })).severity,
            Severity::SeriousInjury
        );
        assert_eq!(normalize(json!({ "INJ_SEV": "Possible Injury" })).severity, Severity::MinorInjury);
        assert_eq!(normalize(json!({ "MAX_SEVERITY": 4 })).severity, Severity::MinorInjury);
    }

    #[test]
    fn test_severity_falls_back_to_injury_count() {
        assert_eq!(
            normalize(json!({ "SEVERITY": "No Apparent Injury", "INJURIES": 1 })).severity,
            Severity::MinorInjury
        );
        assert_eq!(
            normalize(json!({ "SEVERITY": "No Apparent Injury" })).severity,
            Severity::PropertyDamageOnly
        );
    }

    #[test]
    fn test_date_drives_weekday_and_weekend() {
        // 2022-06-18 was a Saturday
        let record = normalize(json!({ "DATE": "2022-06-18" }));
        assert_eq!(record.weekday, "Saturday");
        assert!(record.is_weekend);
        assert_eq!(record.date_text.as_deref(), Some("2022-06-18"));

        let weekday = normalize(json!({ "CRASH_DATE": "06/15/2022" }));
        assert_eq!(weekday.weekday, "Wednesday");
        assert!(!weekday.is_weekend);
    }

    #[test]
    fn test_year_and_month_fall_back_to_date() {
        let record = normalize(json!({ "date": "2023-03-04T10:15:00" }));
        assert_eq!(record.year, Some(2023));
        assert_eq!(record.month, Some(3));
        // Explicit fields still win
        let explicit = normalize(json!({ "date": "2023-03-04", "YEAR": 2022 }));
        assert_eq!(explicit.year, Some(2022));
    }

    #[test]
    fn test_address_guess_and_location() {
        let record = normalize(json!({ "STREET": "Louisville Ave", "CITY": "Monroe" }));
        assert_eq!(record.address_guess, "Louisville Ave, Monroe, Monroe, LA");
        assert_eq!(record.location, "Louisville Ave, Monroe, Monroe, LA");

        let described = normalize(json!({ "LOC_DESC": "I-20 at US-165", "CITY": "" }));
        assert_eq!(described.location, "I-20 at US-165");
        assert_eq!(described.address_guess, "Monroe, LA");
    }

    #[test]
    fn test_feature_level_id_used_when_properties_lack_one() {
        let f: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "id": 42,
            "geometry": { "type": "Point", "coordinates": [-92.1, 32.5] },
            "properties": {}
        }))
        .unwrap();
        let record = normalize_feature(&f, 9, &CrashspotConfig::default()).unwrap();
        assert_eq!(record.id, "42");
    }

    #[test]
    fn test_custom_alias_table() {
        let mut config = CrashspotConfig::default();
        config.aliases.year = vec!["YR".to_string()];
        config.region_suffix = String::new();

        let f = point_feature(json!({ "YR": 2020, "YEAR": 2019 }));
        let record = normalize_feature(&f, 1, &config).unwrap();
        assert_eq!(record.year, Some(2020));
        assert_eq!(record.address_guess, "");
        assert_eq!(record.location, "—");
    }

    #[test]
    fn test_raw_properties_retained() {
        let record = normalize(json!({ "ST_CASE": 220001, "EXTRA": "kept" }));
        assert_eq!(record.id, "220001");
        assert_eq!(record.raw.get("EXTRA"), Some(&json!("kept")));
    }

    #[test]
    fn test_parse_helpers() {
        assert_eq!(parse_int(&json!("12")), Some(12));
        assert_eq!(parse_int(&json!(3.7)), Some(3));
        assert_eq!(parse_int(&json!("")), None);
        assert_eq!(parse_int(&json!(true)), None);
        assert_eq!(parse_text(&json!(1.0)), Some("1".to_string()));
        assert_eq!(parse_text(&json!("  ")), None);
        assert_eq!(parse_float(&json!("0.82")), Some(0.82));
        assert_eq!(parse_date(&json!(1655510400000_i64)), NaiveDate::from_ymd_opt(2022, 6, 18));
    }
}
