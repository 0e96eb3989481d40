//! Reverse-geocoded addresses with a bounded cache.
//!
//! Locations are keyed by their coordinates rounded to 5 decimals (~1 m).
//! Caches hold at most [`DEFAULT_CACHE_CAPACITY`] entries and evict the
//! oldest insertion first; reads do not refresh an entry.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::{debug, warn};
use lru::LruCache;
use tokio::sync::Mutex;

use crate::geo_utils::coordinate_key;
use crate::{CrashspotError, GeoPoint};

/// Maximum number of cached addresses.
pub const DEFAULT_CACHE_CAPACITY: usize = 500;

/// Returned when neither the geocoder nor the caller can name a location.
pub const ADDRESS_UNAVAILABLE: &str = "Address unavailable";

/// Cache key for a location.
pub fn address_key(position: &GeoPoint) -> String {
    coordinate_key(position, 5)
}

// ============================================================================
// Cache
// ============================================================================

/// Storage for resolved addresses.
pub trait AddressCache: Send {
    fn get(&self, key: &str) -> Option<String>;

    /// Insert or overwrite an entry, evicting the oldest when full.
    fn set(&mut self, key: String, address: String);

    /// Remove an entry.
    fn evict(&mut self, key: &str) -> Option<String>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write pending changes to backing storage. No-op for memory caches.
    fn flush(&mut self) -> Result<(), CrashspotError> {
        Ok(())
    }
}

/// In-memory cache backed by an LRU list used in insertion order.
#[derive(Debug)]
pub struct MemoryAddressCache {
    entries: LruCache<String, String>,
}

impl MemoryAddressCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .rev()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl Default for MemoryAddressCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl AddressCache for MemoryAddressCache {
    fn get(&self, key: &str) -> Option<String> {
        // peek keeps the eviction order equal to insertion order
        self.entries.peek(key).cloned()
    }

    fn set(&mut self, key: String, address: String) {
        self.entries.put(key, address);
    }

    fn evict(&mut self, key: &str) -> Option<String> {
        self.entries.pop(key)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Cache persisted to a JSON file so addresses survive across sessions.
///
/// The file holds `[key, address]` pairs oldest first. Changes stay in
/// memory until [`AddressCache::flush`]; a dirty cache also flushes on drop.
#[derive(Debug)]
pub struct JsonFileAddressCache {
    path: PathBuf,
    memory: MemoryAddressCache,
    dirty: bool,
}

impl JsonFileAddressCache {
    /// Open a cache file. A missing or corrupt file starts an empty cache.
    pub fn open(path: impl Into<PathBuf>, capacity: usize) -> Result<Self, CrashspotError> {
        let path = path.into();
        let mut memory = MemoryAddressCache::new(capacity);

        match std::fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Vec<(String, String)>>(&text) {
                Ok(entries) => {
                    for (key, address) in entries {
                        memory.set(key, address);
                    }
                    debug!("[Address] Loaded {} cached addresses", memory.len());
                }
                Err(e) => warn!("[Address] Ignoring corrupt cache {}: {}", path.display(), e),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        Ok(Self {
            path,
            memory,
            dirty: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when there are changes not yet written to disk.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

impl AddressCache for JsonFileAddressCache {
    fn get(&self, key: &str) -> Option<String> {
        self.memory.get(key)
    }

    fn set(&mut self, key: String, address: String) {
        self.memory.set(key, address);
        self.dirty = true;
    }

    fn evict(&mut self, key: &str) -> Option<String> {
        let removed = self.memory.evict(key);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    fn len(&self) -> usize {
        self.memory.len()
    }

    fn flush(&mut self) -> Result<(), CrashspotError> {
        if !self.dirty {
            return Ok(());
        }
        let json = serde_json::to_string(&self.memory.entries())?;
        std::fs::write(&self.path, json)?;
        self.dirty = false;
        debug!("[Address] Wrote {} cached addresses to {}", self.memory.len(), self.path.display());
        Ok(())
    }
}

impl Drop for JsonFileAddressCache {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!("[Address] Failed to persist cache {}: {}", self.path.display(), e);
        }
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// A reverse geocoding backend.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// Human-readable address for a position, `None` when the backend has
    /// no name for it.
    async fn reverse(&self, position: GeoPoint) -> Result<Option<String>, CrashspotError>;
}

/// Reverse geocoding through a cache.
///
/// Cached keys never reach the geocoder. Only successful lookups are
/// cached, so a location that failed once is retried on the next request.
pub struct AddressResolver<G, C = MemoryAddressCache> {
    geocoder: G,
    cache: Mutex<C>,
}

impl<G: ReverseGeocoder> AddressResolver<G, MemoryAddressCache> {
    /// Resolver with an in-memory cache of [`DEFAULT_CACHE_CAPACITY`].
    pub fn new(geocoder: G) -> Self {
        Self::with_cache(geocoder, MemoryAddressCache::default())
    }
}

impl<G: ReverseGeocoder, C: AddressCache> AddressResolver<G, C> {
    pub fn with_cache(geocoder: G, cache: C) -> Self {
        Self {
            geocoder,
            cache: Mutex::new(cache),
        }
    }

    /// Address for `position`, or `fallback` (or [`ADDRESS_UNAVAILABLE`]
    /// when the fallback is empty) if it cannot be resolved.
    pub async fn resolve(&self, position: GeoPoint, fallback: &str) -> String {
        let key = address_key(&position);
        if let Some(hit) = self.cache.lock().await.get(&key) {
            return hit;
        }

        match self.geocoder.reverse(position).await {
            Ok(Some(address)) if !address.trim().is_empty() => {
                self.cache.lock().await.set(key, address.clone());
                address
            }
            Ok(_) => {
                debug!("[Address] No address for {}", key);
                fallback_text(fallback)
            }
            Err(e) => {
                warn!("[Address] Reverse geocoding failed for {}: {}", key, e);
                fallback_text(fallback)
            }
        }
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.lock().await.len()
    }

    /// Persist the cache. Resolution itself never touches the disk.
    pub async fn flush(&self) -> Result<(), CrashspotError> {
        self.cache.lock().await.flush()
    }

    pub fn into_cache(self) -> C {
        self.cache.into_inner()
    }
}

fn fallback_text(fallback: &str) -> String {
    if fallback.trim().is_empty() {
        ADDRESS_UNAVAILABLE.to_string()
    } else {
        fallback.to_string()
    }
}
