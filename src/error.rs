//! Error type shared by the loading, configuration and session APIs.
//!
//! Normalization itself never fails: unusable features are skipped. Errors
//! only surface where a caller asked for something that could not be done
//! at all (a missing crash file, an unreadable config, a session task that
//! died).

use thiserror::Error;

/// Errors returned by fallible crashspot operations.
#[derive(Debug, Error)]
pub enum CrashspotError {
    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The input was not valid GeoJSON.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The input was valid GeoJSON but not a FeatureCollection.
    #[error("expected a FeatureCollection, found {found}")]
    NotFeatureCollection {
        /// What the document actually contained.
        found: &'static str,
    },

    /// A TOML configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),

    /// A config parsed but holds a value no component can work with.
    #[error("invalid config: {message}")]
    InvalidConfig {
        /// Which setting was rejected and why.
        message: String,
    },

    /// The drive session task panicked or was aborted.
    #[error("drive session task failed: {0}")]
    Session(String),

    /// Reverse geocoding request failed.
    #[cfg(feature = "http")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reverse geocoding response could not be interpreted.
    #[error("geocoder error: {message}")]
    Geocode {
        /// Description of the failure.
        message: String,
    },
}
