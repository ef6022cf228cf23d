use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use mockable::{Clock, DefaultClock};

use super::{CacheError, CachePattern, CacheStore};

struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-process cache store.
///
/// Expiry is read from the injected clock; expired entries are never returned
/// and are dropped the next time they are read.
pub struct MemoryCacheStore {
    entries: DashMap<String, CacheEntry>,
    clock: Arc<dyn Clock + Send + Sync>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock + Send + Sync>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Number of stored entries, expired ones included until purged.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.utc();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before.saturating_sub(self.entries.len())
    }
}

impl Default for MemoryCacheStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = self.clock.utc();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            self.entries.remove_if(key, |_, entry| entry.expires_at <= now);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let ttl = TimeDelta::from_std(ttl)
            .map_err(|e| CacheError::Backend(format!("TTL out of range: {}", e)))?;
        let expires_at = self
            .clock
            .utc()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        self.entries
            .insert(key.to_string(), CacheEntry { value, expires_at });
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        self.entries.remove(key);
        Ok(())
    }

    async fn remove_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let matcher = CachePattern::new(pattern)?;
        let keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| matcher.matches(entry.key()))
            .map(|entry| entry.key().clone())
            .collect();

        let removed = keys
            .iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count();
        Ok(removed as u64)
    }
}
