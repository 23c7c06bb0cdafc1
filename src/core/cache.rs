use std::time::Duration;

use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::core::config::CacheConfig;

/// TTL side-cache over Redis.
///
/// Entries are JSON values under `"{namespace}:{key}"`. Write paths evict a
/// whole namespace at once. Every operation degrades to a no-op (a miss, for
/// reads) when the cache is disabled or Redis misbehaves; the cache is never
/// load-bearing for correctness.
pub struct ResponseCache {
    conn: Option<ConnectionManager>,
    ttl_secs: u64,
}

impl ResponseCache {
    pub async fn connect(config: &CacheConfig) -> Self {
        let conn = match &config.url {
            Some(url) => match Self::open(url, config.connection_timeout_ms).await {
                Ok(conn) => Some(conn),
                Err(e) => {
                    warn!("Cache unavailable, running without it: {}", e);
                    None
                }
            },
            None => None,
        };

        Self {
            conn,
            ttl_secs: config.ttl_secs,
        }
    }

    /// A cache that never hits. Used when no cache URL is configured and in
    /// tests.
    pub fn disabled() -> Self {
        Self {
            conn: None,
            ttl_secs: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    async fn open(url: &str, timeout_ms: u64) -> Result<ConnectionManager, redis::RedisError> {
        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(1)
            .set_connection_timeout(Duration::from_millis(timeout_ms));

        let client = redis::Client::open(url)?;
        client
            .get_connection_manager_with_config(manager_config)
            .await
    }

    fn full_key(namespace: &str, key: &str) -> String {
        format!("{}:{}", namespace, key)
    }

    pub async fn get<T: DeserializeOwned>(&self, namespace: &str, key: &str) -> Option<T> {
        let mut conn = self.conn.clone()?;
        let full_key = Self::full_key(namespace, key);

        let raw: Option<String> = match redis::cmd("GET")
            .arg(&full_key)
            .query_async(&mut conn)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Cache read failed for {}: {}", full_key, e);
                return None;
            }
        };

        raw.and_then(|json| match serde_json::from_str(&json) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Cache entry {} is not valid JSON: {}", full_key, e);
                None
            }
        })
    }

    pub async fn put<T: Serialize>(&self, namespace: &str, key: &str, value: &T) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let full_key = Self::full_key(namespace, key);

        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!("Failed to serialize cache entry {}: {}", full_key, e);
                return;
            }
        };

        let result: Result<(), redis::RedisError> = redis::cmd("SET")
            .arg(&full_key)
            .arg(json)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async(&mut conn)
            .await;

        if let Err(e) = result {
            warn!("Cache write failed for {}: {}", full_key, e);
        }
    }

    /// Drop every entry in a namespace. Invalidation is wholesale, not
    /// per-key.
    pub async fn evict_namespace(&self, namespace: &str) {
        let Some(mut conn) = self.conn.clone() else {
            return;
        };
        let pattern = format!("{}:*", namespace);
        let mut cursor: u64 = 0;

        loop {
            let scanned: Result<(u64, Vec<String>), redis::RedisError> = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await;

            let (next, keys) = match scanned {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("Cache eviction scan failed for {}: {}", pattern, e);
                    return;
                }
            };

            if !keys.is_empty() {
                let result: Result<(), redis::RedisError> =
                    redis::cmd("DEL").arg(&keys).query_async(&mut conn).await;
                if let Err(e) = result {
                    warn!("Cache eviction delete failed for {}: {}", pattern, e);
                    return;
                }
            }

            cursor = next;
            if cursor == 0 {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaced_keys() {
        assert_eq!(ResponseCache::full_key("notices", "42"), "notices:42");
        assert_eq!(
            ResponseCache::full_key("files", "9f3b.txt"),
            "files:9f3b.txt"
        );
    }

    #[tokio::test]
    async fn disabled_cache_always_misses() {
        let cache = ResponseCache::disabled();
        assert!(!cache.is_enabled());

        cache.put("notices", "1", &"payload").await;
        let hit: Option<String> = cache.get("notices", "1").await;
        assert!(hit.is_none());

        // eviction on a disabled cache is a no-op
        cache.evict_namespace("notices").await;
    }
}
