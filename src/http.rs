//! Nominatim reverse geocoder.
//!
//! The public Nominatim instance allows at most one request per second, so
//! request starts are spaced by a dispatch limiter and a 429 response backs
//! off exponentially before retrying.
//!
//! See <https://nominatim.org/release-docs/develop/api/Reverse/>

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::{CrashspotError, GeoPoint, ReverseGeocoder};

/// Public OpenStreetMap instance.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

// Nominatim usage policy: 1 request per second
const DISPATCH_INTERVAL_MS: u64 = 1000;
const MAX_RETRIES: u32 = 3;

/// Reverse endpoint response; only the display name is used.
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    display_name: Option<String>,
}

/// Spaces out when requests start.
struct DispatchRateLimiter {
    interval: Duration,
    next_dispatch: Mutex<Instant>,
    consecutive_429s: AtomicU32,
}

impl DispatchRateLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_dispatch: Mutex::new(Instant::now()),
            consecutive_429s: AtomicU32::new(0),
        }
    }

    /// Wait for our dispatch slot. Each caller gets a unique slot.
    async fn wait_for_dispatch_slot(&self) {
        let wait = {
            let mut next = self.next_dispatch.lock().await;
            let now = Instant::now();
            let dispatch_at = if *next > now { *next } else { now };
            *next = dispatch_at + self.interval;
            dispatch_at - now
        };

        // Wait outside the lock
        if !wait.is_zero() {
            debug!("[Nominatim] Waiting {:?} for dispatch slot", wait);
            tokio::time::sleep(wait).await;
        }
    }

    fn record_success(&self) {
        self.consecutive_429s.store(0, Ordering::Relaxed);
    }

    fn record_429(&self) -> Duration {
        let count = self.consecutive_429s.fetch_add(1, Ordering::Relaxed) + 1;
        // Exponential backoff: 2s, 4s, 8s max
        let backoff = Duration::from_millis(DISPATCH_INTERVAL_MS * (1 << count.min(3)));
        warn!("[Nominatim] Got 429, consecutive: {}, backing off {:?}", count, backoff);
        backoff
    }
}

/// Reverse geocoder backed by a Nominatim server.
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
    rate_limiter: DispatchRateLimiter,
}

impl NominatimGeocoder {
    /// Client for the public OpenStreetMap instance.
    pub fn new() -> Result<Self, CrashspotError> {
        Self::with_base_url(DEFAULT_NOMINATIM_URL)
    }

    /// Client for a self-hosted instance.
    pub fn with_base_url(base_url: &str) -> Result<Self, CrashspotError> {
        let client = Client::builder()
            .user_agent(concat!("crashspot/", env!("CARGO_PKG_VERSION")))
            .pool_idle_timeout(Duration::from_secs(60))
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            rate_limiter: DispatchRateLimiter::new(Duration::from_millis(DISPATCH_INTERVAL_MS)),
        })
    }

    fn reverse_url(&self) -> String {
        format!("{}/reverse", self.base_url)
    }
}

/// Extract the display name from a reverse response body.
fn parse_display_name(body: &str) -> Result<Option<String>, CrashspotError> {
    let response: ReverseResponse = serde_json::from_str(body)?;
    Ok(response
        .display_name
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

#[async_trait]
impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, position: GeoPoint) -> Result<Option<String>, CrashspotError> {
        let lat = position.latitude.to_string();
        let lon = position.longitude.to_string();
        let mut retries = 0;

        loop {
            self.rate_limiter.wait_for_dispatch_slot().await;

            let resp = self
                .client
                .get(self.reverse_url())
                .query(&[("format", "jsonv2"), ("lat", lat.as_str()), ("lon", lon.as_str())])
                .header("Accept-Language", "en")
                .send()
                .await?;

            let status = resp.status();
            if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                retries += 1;
                if retries > MAX_RETRIES {
                    return Err(CrashspotError::Geocode {
                        message: "max retries exceeded (429)".to_string(),
                    });
                }
                tokio::time::sleep(self.rate_limiter.record_429()).await;
                continue;
            }

            self.rate_limiter.record_success();

            if !status.is_success() {
                return Err(CrashspotError::Geocode {
                    message: format!("HTTP {}", status),
                });
            }

            let body = resp.text().await?;
            return parse_display_name(&body);
        }
    }
}
