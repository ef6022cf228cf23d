//! Cache Manager
//!
//! Typed key/value cache with per-entry TTL and wildcard invalidation. The
//! cache is never load-bearing: every store failure is logged and degrades
//! to a miss (reads) or a no-op (writes and removals).
//!
//! Stores:
//! - `MemoryCacheStore` - in-process, clock-driven expiry
//! - `RedisCacheStore` - shared cache for multi-instance deployments

pub mod keys;
mod memory;
mod pattern;
mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

pub use self::memory::MemoryCacheStore;
pub use self::pattern::CachePattern;
pub use self::redis_store::RedisCacheStore;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache backend error: {0}")]
    Backend(String),

    #[error("Invalid cache pattern: {0}")]
    Pattern(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<::redis::RedisError> for CacheError {
    fn from(err: ::redis::RedisError) -> Self {
        CacheError::Backend(err.to_string())
    }
}

/// Raw string store behind the cache manager.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Live value for `key`; expired entries are treated as absent.
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Insert or overwrite `key`, expiring `ttl` from now.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError>;

    async fn remove(&self, key: &str) -> Result<(), CacheError>;

    /// Remove every key matching a `*` / `?` wildcard pattern.
    async fn remove_by_pattern(&self, pattern: &str) -> Result<u64, CacheError>;
}

#[derive(Clone)]
pub struct CacheManager {
    store: Arc<dyn CacheStore>,
}

impl CacheManager {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// In-process cache on the system clock.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCacheStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Cached value for `key`, or `None` when missing, expired, unreadable
    /// or when the store failed.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key = %key, error = %e, "Unreadable cache entry, treating as miss");
                None
            }
        }
    }

    pub async fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize cache entry");
                return;
            }
        };

        if let Err(e) = self.store.set(key, raw, ttl).await {
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    pub async fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key).await {
            warn!(key = %key, error = %e, "Cache remove failed");
        }
    }

    pub async fn remove_by_pattern(&self, pattern: &str) -> u64 {
        match self.store.remove_by_pattern(pattern).await {
            Ok(removed) => {
                debug!(pattern = %pattern, removed, "Cache entries invalidated");
                removed
            }
            Err(e) => {
                warn!(pattern = %pattern, error = %e, "Cache pattern removal failed");
                0
            }
        }
    }

    /// Remove an exact key, or every matching key when given a wildcard pattern.
    pub async fn invalidate(&self, key_or_pattern: &str) {
        if CachePattern::is_pattern(key_or_pattern) {
            self.remove_by_pattern(key_or_pattern).await;
        } else {
            self.remove(key_or_pattern).await;
        }
    }
}
