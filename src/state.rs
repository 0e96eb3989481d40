//! Map session state.
//!
//! [`CrashMapState`] owns the loaded layers, the active filter and the
//! filtered view derived from it. Every load re-applies the current filter
//! so the view never refers to records from a previous load.

use geojson::FeatureCollection;
use log::info;

use crate::drive::ProximityAlertEngine;
use crate::filter::{apply_filter, CrashFilter};
use crate::heatmap::{generate_density_grid, DensityGrid};
use crate::hotspots::{rank_hotspots, top_hotspots, HotspotCandidate};
use crate::insights::{summarize, InsightSummary};
use crate::layers::{parse_feature_collection, ClusterMarker, LayerPaths, LayerSet, RoadSegment};
use crate::normalize::normalize_collection;
use crate::{CrashRecord, CrashspotConfig, CrashspotError};

/// Everything one map session works with.
#[derive(Debug, Clone)]
pub struct CrashMapState {
    config: CrashspotConfig,
    records: Vec<CrashRecord>,
    filter: CrashFilter,
    filtered: Vec<CrashRecord>,
    clusters: Vec<ClusterMarker>,
    roads: Vec<RoadSegment>,
    /// Full ranked list
    hotspots: Vec<HotspotCandidate>,
}

impl CrashMapState {
    pub fn new(config: CrashspotConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
            filter: CrashFilter::default(),
            filtered: Vec::new(),
            clusters: Vec::new(),
            roads: Vec::new(),
            hotspots: Vec::new(),
        }
    }

    pub fn config(&self) -> &CrashspotConfig {
        &self.config
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Replace the crash records with a normalized collection.
    ///
    /// Returns the number of records kept.
    pub fn load_crashes(&mut self, collection: &FeatureCollection) -> usize {
        self.records = normalize_collection(collection, &self.config);
        self.refilter();
        self.records.len()
    }

    /// Parse and load a crash FeatureCollection document.
    pub fn load_crashes_str(&mut self, geojson: &str) -> Result<usize, CrashspotError> {
        let collection = parse_feature_collection(geojson)?;
        Ok(self.load_crashes(&collection))
    }

    /// Replace the hotspots with a ranked predicted-risk collection.
    pub fn load_risk(&mut self, collection: &FeatureCollection) -> usize {
        self.hotspots = rank_hotspots(&collection.features, &self.config.aliases);
        self.hotspots.len()
    }

    pub fn load_risk_str(&mut self, geojson: &str) -> Result<usize, CrashspotError> {
        let collection = parse_feature_collection(geojson)?;
        Ok(self.load_risk(&collection))
    }

    /// Load all layers from disk. Fails only when the crash layer fails;
    /// the state is left untouched in that case.
    pub fn load_layers(&mut self, paths: &LayerPaths) -> Result<(), CrashspotError> {
        let layers = LayerSet::load(paths, &self.config)?;
        self.set_layers(layers);
        Ok(())
    }

    /// Install an already loaded layer set.
    pub fn set_layers(&mut self, layers: LayerSet) {
        self.records = layers.crashes;
        self.clusters = layers.clusters;
        self.roads = layers.roads;
        self.hotspots = layers.hotspots;
        self.refilter();
    }

    // ========================================================================
    // Filtering
    // ========================================================================

    /// Make `filter` the active filter and return the matching records.
    pub fn apply_filter(&mut self, filter: CrashFilter) -> &[CrashRecord] {
        self.filter = filter;
        self.refilter();
        &self.filtered
    }

    fn refilter(&mut self) {
        self.filtered = apply_filter(&self.records, &self.filter);
        info!(
            "[State] {} of {} crashes match the active filter",
            self.filtered.len(),
            self.records.len()
        );
    }

    pub fn filter(&self) -> &CrashFilter {
        &self.filter
    }

    /// All loaded records.
    pub fn records(&self) -> &[CrashRecord] {
        &self.records
    }

    /// Records matching the active filter.
    pub fn filtered(&self) -> &[CrashRecord] {
        &self.filtered
    }

    // ========================================================================
    // Derived views
    // ========================================================================

    /// Density grid of the filtered records.
    pub fn density_grid(&self) -> DensityGrid {
        generate_density_grid(&self.filtered, &self.config.density)
    }

    /// KPIs and top locations of the filtered records.
    pub fn insights(&self) -> InsightSummary {
        summarize(&self.filtered, self.config.top_locations)
    }

    pub fn clusters(&self) -> &[ClusterMarker] {
        &self.clusters
    }

    pub fn roads(&self) -> &[RoadSegment] {
        &self.roads
    }

    /// The full ranked hotspot list.
    pub fn hotspots(&self) -> &[HotspotCandidate] {
        &self.hotspots
    }

    /// The hotspots shown on the map.
    pub fn top_hotspots(&self) -> &[HotspotCandidate] {
        top_hotspots(&self.hotspots, self.config.hotspot_display_count)
    }

    /// A fresh alert engine over the full hotspot list.
    pub fn alert_engine(&self) -> ProximityAlertEngine {
        ProximityAlertEngine::new(self.hotspots.clone(), self.config.alert.clone())
    }
}
