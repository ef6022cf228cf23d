use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::info;

use super::{CacheError, CachePattern, CacheStore};

const SCAN_BATCH: usize = 200;

/// Redis-backed cache store shared by every server instance.
///
/// All keys are namespaced with `key_prefix`; callers never see the prefix.
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
    key_prefix: String,
}

impl RedisCacheStore {
    pub async fn connect(redis_url: &str, key_prefix: &str) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        info!(prefix = %key_prefix, "Connected to Redis cache");

        Ok(Self {
            conn,
            key_prefix: key_prefix.to_string(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(self.key(key)).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let millis = ttl.as_millis() as u64;
        if millis == 0 {
            let _: () = conn.del(self.key(key)).await?;
            return Ok(());
        }

        // SET key value PX millis
        let _: () = redis::cmd("SET")
            .arg(self.key(key))
            .arg(value)
            .arg("PX")
            .arg(millis)
            .query_async(&mut conn)
            .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(self.key(key)).await?;
        Ok(())
    }

    async fn remove_by_pattern(&self, pattern: &str) -> Result<u64, CacheError> {
        let glob = CachePattern::new(pattern)?.to_redis_glob(&self.key_prefix);
        let mut conn = self.conn.clone();
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;

        loop {
            let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&glob)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await?;
                removed += deleted;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(removed)
    }
}
