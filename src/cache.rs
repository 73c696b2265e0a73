//! Process-wide memo of fetched series, shared by every session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::db::{SeriesSource, SourceError};
use crate::models::HistoricalPoint;

pub type Series = Arc<[HistoricalPoint]>;

/// Identifies one fetch: whose credentials, and which query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub identity: String,
    pub query: String,
}

#[derive(Debug, Clone)]
struct CacheEntry {
    series: Series,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(series: Series, ttl: Option<Duration>) -> Self {
        Self {
            series,
            expires_at: ttl.map(|d| Instant::now() + d),
        }
    }

    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Instant::now() >= expires_at,
            None => false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SeriesCache {
    store: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    ttl: Option<Duration>,
}

impl SeriesCache {
    /// `ttl_secs == 0` keeps entries until they are invalidated.
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            store: Arc::new(RwLock::new(HashMap::new())),
            ttl: (ttl_secs > 0).then(|| Duration::from_secs(ttl_secs)),
        }
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Series> {
        {
            let store = self.store.read().await;
            match store.get(key) {
                Some(entry) if !entry.is_expired() => return Some(entry.series.clone()),
                Some(_) => {}
                None => return None,
            }
        }
        let mut store = self.store.write().await;
        if store.get(key).is_some_and(CacheEntry::is_expired) {
            store.remove(key);
            debug!(query = %key.query, "Evicted expired series");
        }
        None
    }

    pub async fn insert(&self, key: CacheKey, series: Series) {
        let mut store = self.store.write().await;
        store.insert(key, CacheEntry::new(series, self.ttl));
    }

    /// Returns the cached series for `source`, fetching on a miss.
    /// Failures are never cached.
    pub async fn get_or_fetch(&self, source: &dyn SeriesSource) -> Result<Series, SourceError> {
        let key = source.cache_key();
        if let Some(series) = self.get(&key).await {
            debug!(rows = series.len(), "Series cache hit");
            return Ok(series);
        }

        debug!("Series cache miss");
        let series: Series = source.fetch_series().await?.into();
        self.insert(key, series.clone()).await;
        Ok(series)
    }

    /// Drops every entry. Returns how many were removed.
    pub async fn invalidate_all(&self) -> usize {
        let mut store = self.store.write().await;
        let removed = store.len();
        store.clear();
        info!(removed, "Series cache invalidated");
        removed
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }
}
