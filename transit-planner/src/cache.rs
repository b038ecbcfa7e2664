//! Caching layer for computed route lists.
//!
//! Keys are built from the origin and destination coordinates rounded to a
//! fixed number of decimal places, so requests from practically the same
//! spot share an entry. Entries are replaced wholesale on insert.
//!
//! Two concurrent misses for the same key both compute and both insert; the
//! later insert wins. Results are deterministic, so this only costs time.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use moka::future::Cache as MokaCache;

use crate::domain::{Coordinates, Route};

/// Cache key: rounded (origin, destination) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    origin: (i64, i64),
    destination: (i64, i64),
}

impl RouteKey {
    /// Build a key rounding both points to `precision` decimal places.
    pub fn new(origin: &Coordinates, destination: &Coordinates, precision: u32) -> Self {
        Self {
            origin: origin.rounded(precision),
            destination: destination.rounded(precision),
        }
    }
}

/// A cached route list.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: RouteKey,
    pub routes: Vec<Route>,
    pub created_at: DateTime<Utc>,
}

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,

    /// Decimal places kept when rounding coordinates into a key.
    /// 4 places is roughly 11 m of latitude.
    pub precision: u32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(600),
            max_capacity: 10_000,
            precision: 4,
        }
    }
}

/// Cache of final route lists.
pub struct RouteCache {
    entries: MokaCache<RouteKey, Arc<CacheEntry>>,
    precision: u32,
}

impl RouteCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let entries = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self {
            entries,
            precision: config.precision,
        }
    }

    /// The key for a trip.
    pub fn key(&self, origin: &Coordinates, destination: &Coordinates) -> RouteKey {
        RouteKey::new(origin, destination, self.precision)
    }

    /// Get a cached entry.
    pub async fn get(&self, key: &RouteKey) -> Option<Arc<CacheEntry>> {
        self.entries.get(key).await
    }

    /// Store `routes` under `key`, replacing any existing entry.
    pub async fn set(&self, key: RouteKey, routes: Vec<Route>) -> Arc<CacheEntry> {
        let entry = Arc::new(CacheEntry {
            key,
            routes,
            created_at: Utc::now(),
        });
        self.entries.insert(key, Arc::clone(&entry)).await;
        entry
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }
}
