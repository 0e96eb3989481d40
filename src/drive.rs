//! Drive mode: proximity alerts against ranked hotspots.
//!
//! [`ProximityAlertEngine`] is a two-state machine (Off / Active) fed with
//! position fixes. While active, each fix is checked against the hotspot
//! list and the nearest hotspot inside the trigger radius raises an alert
//! the first time it is approached in a session. Re-entering the radius of
//! an already alerted hotspot is silent until the session is restarted.
//!
//! [`DriveSession`] runs an engine on a tokio task over any position
//! stream and forwards alerts and status changes through a channel.

use std::collections::HashSet;
use std::fmt;

use futures::{Stream, StreamExt};
use log::{debug, info, warn};
use rstar::{RTree, RTreeObject, AABB};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::geo_utils::{haversine_distance, meters_to_degrees};
use crate::{CrashspotError, GeoPoint, HotspotCandidate};

// ============================================================================
// Configuration
// ============================================================================

/// What to do when the position source reports an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Report the error and keep listening.
    #[default]
    StayActive,
    /// Report the error and end the session.
    StopSession,
}

/// Configuration for proximity alerts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Distance at which a hotspot counts as nearby (default: 120m)
    pub trigger_radius_meters: f64,
    /// Handling of position source errors (default: stay active)
    pub error_policy: ErrorPolicy,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            trigger_radius_meters: 120.0,
            error_policy: ErrorPolicy::StayActive,
        }
    }
}

// ============================================================================
// Events
// ============================================================================

/// One item from a position source.
#[derive(Debug, Clone, PartialEq)]
pub enum PositionEvent {
    Fix(GeoPoint),
    Error(String),
}

/// User-visible drive mode status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DriveStatus {
    Off,
    Locating,
    NearHotspot,
    LocationError(String),
}

impl fmt::Display for DriveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DriveStatus::Off => f.write_str("Drive mode: off"),
            DriveStatus::Locating => f.write_str("Drive mode: locating…"),
            DriveStatus::NearHotspot => f.write_str("Near predicted hotspot"),
            DriveStatus::LocationError(_) => f.write_str("Drive mode: location error"),
        }
    }
}

/// Raised once per hotspot per session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProximityAlert {
    pub hotspot: HotspotCandidate,
    /// Position of the hotspot in the ranked list (0 = riskiest)
    pub rank: usize,
    /// Rounded distance from the fix to the hotspot
    pub distance_meters: u32,
}

impl fmt::Display for ProximityAlert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Approaching predicted hotspot (~{} m). Please drive carefully.",
            self.distance_meters
        )
    }
}

/// Output of a running [`DriveSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum DriveEvent {
    Alert(ProximityAlert),
    Status(DriveStatus),
}

// ============================================================================
// Spatial index
// ============================================================================

/// Above this latitude `meters_to_degrees` clamps its cos(lat) factor, so
/// the degree envelope no longer covers the trigger radius.
const POLAR_SCAN_LATITUDE: f64 = 84.0;

/// A hotspot with its rank for R-tree queries
#[derive(Debug, Clone, Copy)]
struct IndexedHotspot {
    rank: usize,
    lat: f64,
    lng: f64,
}

impl RTreeObject for IndexedHotspot {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lat, self.lng])
    }
}

fn build_index(hotspots: &[HotspotCandidate]) -> RTree<IndexedHotspot> {
    let indexed: Vec<IndexedHotspot> = hotspots
        .iter()
        .enumerate()
        .map(|(rank, h)| IndexedHotspot {
            rank,
            lat: h.position.latitude,
            lng: h.position.longitude,
        })
        .collect();
    RTree::bulk_load(indexed)
}

// ============================================================================
// Engine
// ============================================================================

/// Smallest distance; ties go to the lower rank.
fn nearest(candidates: impl Iterator<Item = (usize, f64)>) -> Option<(usize, f64)> {
    candidates.min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)))
}

/// Debounced proximity alerts for a single driver.
#[derive(Debug)]
pub struct ProximityAlertEngine {
    config: AlertConfig,
    hotspots: Vec<HotspotCandidate>,
    index: RTree<IndexedHotspot>,
    /// Hotspot keys already alerted in the current session
    alerted: HashSet<String>,
    active: bool,
    status: DriveStatus,
}

impl ProximityAlertEngine {
    /// Create an engine in the Off state. `hotspots` must be in rank order.
    pub fn new(hotspots: Vec<HotspotCandidate>, config: AlertConfig) -> Self {
        let index = build_index(&hotspots);
        Self {
            config,
            hotspots,
            index,
            alerted: HashSet::new(),
            active: false,
            status: DriveStatus::Off,
        }
    }

    /// Replace the hotspot list. Alerts already raised this session stay
    /// suppressed for hotspots at the same position.
    pub fn set_hotspots(&mut self, hotspots: Vec<HotspotCandidate>) {
        self.index = build_index(&hotspots);
        self.hotspots = hotspots;
    }

    pub fn hotspots(&self) -> &[HotspotCandidate] {
        &self.hotspots
    }

    pub fn config(&self) -> &AlertConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn status(&self) -> &DriveStatus {
        &self.status
    }

    /// Number of hotspots alerted in the current session.
    pub fn alerted_count(&self) -> usize {
        self.alerted.len()
    }

    /// Off → Active. Clears alert history. No-op when already active.
    ///
    /// Returns the new status if the state changed.
    pub fn start(&mut self) -> Option<DriveStatus> {
        if self.active {
            return None;
        }
        self.active = true;
        self.alerted.clear();
        self.status = DriveStatus::Locating;
        info!(
            "[Drive] Session started with {} hotspots, radius {}m",
            self.hotspots.len(),
            self.config.trigger_radius_meters
        );
        Some(self.status.clone())
    }

    /// Active → Off. Discards alert history. No-op when already off.
    pub fn stop(&mut self) -> Option<DriveStatus> {
        if !self.active {
            return None;
        }
        info!("[Drive] Session stopped after {} alerts", self.alerted.len());
        self.active = false;
        self.alerted.clear();
        self.status = DriveStatus::Off;
        Some(self.status.clone())
    }

    /// Nearest hotspot within the trigger radius, as (rank, distance).
    ///
    /// Equal distances resolve to the higher-ranked hotspot. The R-tree
    /// envelope is flat in degrees, so fixes whose search box would cross
    /// the antimeridian or reach polar latitudes scan every hotspot instead.
    pub fn nearest_within_radius(&self, position: &GeoPoint) -> Option<(usize, f64)> {
        let radius = self.config.trigger_radius_meters;
        let within = |rank: usize| {
            let d = haversine_distance(position, &self.hotspots[rank].position);
            (d <= radius).then_some((rank, d))
        };

        let margin = meters_to_degrees(radius, position.latitude) * 1.1;
        let polar = position.latitude.abs() > POLAR_SCAN_LATITUDE;
        let wraps = position.longitude - margin < -180.0 || position.longitude + margin > 180.0;

        if polar || wraps || !margin.is_finite() {
            return nearest((0..self.hotspots.len()).filter_map(within));
        }

        let search = AABB::from_corners(
            [position.latitude - margin, position.longitude - margin],
            [position.latitude + margin, position.longitude + margin],
        );
        nearest(
            self.index
                .locate_in_envelope_intersecting(&search)
                .filter_map(|h| within(h.rank)),
        )
    }

    /// Process a position fix. Fixes while Off are ignored.
    pub fn on_position(&mut self, position: GeoPoint) -> Option<ProximityAlert> {
        if !self.active {
            return None;
        }
        let (rank, distance) = self.nearest_within_radius(&position)?;
        let hotspot = &self.hotspots[rank];
        if !self.alerted.insert(hotspot.key()) {
            return None;
        }

        self.status = DriveStatus::NearHotspot;
        let alert = ProximityAlert {
            hotspot: hotspot.clone(),
            rank,
            distance_meters: distance.round() as u32,
        };
        debug!(
            "[Drive] Alert for hotspot #{} at {}m",
            alert.rank, alert.distance_meters
        );
        Some(alert)
    }

    /// Process a position source error. Returns the status changes in order.
    pub fn on_position_error(&mut self, message: String) -> Vec<DriveStatus> {
        if !self.active {
            return Vec::new();
        }
        warn!("[Drive] Position error: {}", message);
        self.status = DriveStatus::LocationError(message);
        let mut changes = vec![self.status.clone()];
        if self.config.error_policy == ErrorPolicy::StopSession {
            changes.extend(self.stop());
        }
        changes
    }
}

// ============================================================================
// Session
// ============================================================================

/// A running drive session on a tokio task.
///
/// Dropping the session cancels it without waiting.
#[derive(Debug)]
pub struct DriveSession {
    cancel: Option<oneshot::Sender<()>>,
    handle: JoinHandle<ProximityAlertEngine>,
}

impl DriveSession {
    /// Start `engine` and consume `positions` until the stream ends, the
    /// error policy stops the session, or [`stop`](Self::stop) is called.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S>(
        mut engine: ProximityAlertEngine,
        positions: S,
        events: mpsc::UnboundedSender<DriveEvent>,
    ) -> Self
    where
        S: Stream<Item = PositionEvent> + Send + Unpin + 'static,
    {
        let (cancel_tx, mut cancel_rx) = oneshot::channel::<()>();

        let handle = tokio::spawn(async move {
            let mut positions = positions;
            let emit = |event: DriveEvent| {
                // A closed receiver only means nobody is listening
                let _ = events.send(event);
            };

            if let Some(status) = engine.start() {
                emit(DriveEvent::Status(status));
            }

            loop {
                tokio::select! {
                    biased;
                    _ = &mut cancel_rx => break,
                    next = positions.next() => match next {
                        Some(PositionEvent::Fix(p)) => {
                            if let Some(alert) = engine.on_position(p) {
                                emit(DriveEvent::Alert(alert));
                                emit(DriveEvent::Status(DriveStatus::NearHotspot));
                            }
                        }
                        Some(PositionEvent::Error(message)) => {
                            for status in engine.on_position_error(message) {
                                emit(DriveEvent::Status(status));
                            }
                            if !engine.is_active() {
                                break;
                            }
                        }
                        None => break,
                    }
                }
            }

            if let Some(status) = engine.stop() {
                emit(DriveEvent::Status(status));
            }
            engine
        });

        Self {
            cancel: Some(cancel_tx),
            handle,
        }
    }

    /// Whether the session has ended on its own.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the position subscription and wait for the task to wind down.
    ///
    /// No events are sent after this returns. The engine comes back in the
    /// Off state, ready for another session.
    pub async fn stop(mut self) -> Result<ProximityAlertEngine, CrashspotError> {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        self.join().await
    }

    /// Wait for the session to end on its own (stream exhausted or stopped
    /// by the error policy).
    pub async fn finished(mut self) -> Result<ProximityAlertEngine, CrashspotError> {
        let _keep_alive = self.cancel.take();
        self.join().await
    }

    async fn join(self) -> Result<ProximityAlertEngine, CrashspotError> {
        self.handle
            .await
            .map_err(|e| CrashspotError::Session(e.to_string()))
    }
}
