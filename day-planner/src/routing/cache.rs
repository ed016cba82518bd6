//! Caching layer for route lookups.
//!
//! Removing a stop and adding it back, or re-planning the same pair of
//! places, asks for segments the routing service has already answered.
//! Successful estimates are cached by their endpoint coordinates; failures
//! are never cached so a later retry reaches the service again.

use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::domain::{Location, LocationKey};

use super::error::RouteError;
use super::{RouteEstimate, RouteLookup};

/// Cache key: (origin, destination). Direction matters.
type SegmentKey = (LocationKey, LocationKey);

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(15 * 60),
            max_capacity: 1000,
        }
    }
}

/// Route lookup with caching.
///
/// Wraps any [`RouteLookup`] and caches its successful answers.
pub struct CachedRouteLookup<L> {
    inner: L,
    cache: MokaCache<SegmentKey, RouteEstimate>,
}

impl<L: RouteLookup> CachedRouteLookup<L> {
    /// Create a new cached lookup.
    pub fn new(inner: L, config: &CacheConfig) -> Self {
        let cache = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { inner, cache }
    }

    /// Access the wrapped lookup for calls that bypass the cache.
    pub fn inner(&self) -> &L {
        &self.inner
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

impl<L: RouteLookup> RouteLookup for CachedRouteLookup<L> {
    async fn lookup(&self, from: Location, to: Location) -> Result<RouteEstimate, RouteError> {
        let key = (from.key(), to.key());

        if let Some(cached) = self.cache.get(&key).await {
            trace!(%from, %to, "route cache hit");
            return Ok(cached);
        }

        let estimate = self.inner.lookup(from, to).await?;
        self.cache.insert(key, estimate.clone()).await;

        Ok(estimate)
    }
}
