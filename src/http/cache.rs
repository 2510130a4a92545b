//! Time bounded memoization of response bodies

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
    time::{Duration, Instant},
};

#[derive(Debug, Clone)]
struct CacheEntry {
    body: Vec<u8>,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now <= self.expires_at
    }
}

/// Response bodies keyed by request, each valid for its own TTL.
///
/// Concurrent misses on the same key may both compute; the last write wins.
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the live body stored under `key`, or runs `compute` and keeps
    /// its body for `ttl`. Errors from `compute` are returned and not stored.
    pub fn get_or_compute<F, E>(&self, key: &str, ttl: Duration, compute: F) -> Result<Vec<u8>, E>
    where
        F: FnOnce() -> Result<Vec<u8>, E>,
    {
        if let Some(body) = self.get(key) {
            log::debug!("cache hit: {key}");
            return Ok(body);
        }

        log::debug!("cache miss: {key}");
        let body = compute()?;
        self.insert(key, body.clone(), ttl);
        Ok(body)
    }

    fn get(&self, key: &str) -> Option<Vec<u8>> {
        let now = Instant::now();
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.body.clone())
    }

    fn insert(&self, key: &str, body: Vec<u8>, ttl: Duration) {
        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|_, entry| entry.is_live(now));
        entries.insert(
            key.to_string(),
            CacheEntry {
                body,
                expires_at: now + ttl,
            },
        );
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let dropped = entries.len();
        entries.clear();
        log::info!("response cache cleared, {dropped} entries dropped");
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
