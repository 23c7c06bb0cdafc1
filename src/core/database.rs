use crate::core::config::{DatabaseConfig, ReplicationConfig};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await
}

/// Primary/replica pool pair with explicit connection selection.
///
/// Services pick the pool per operation: `writer()` for read-write work,
/// `reader()` for read-only work. Reads issued inside a read-write operation
/// must use `writer()` so they observe the primary.
pub struct ReplicationPool {
    primary: PgPool,
    replica: Option<PgPool>,
}

impl ReplicationPool {
    pub fn new(primary: PgPool, replica: Option<PgPool>) -> Self {
        Self { primary, replica }
    }

    pub async fn connect(config: &ReplicationConfig) -> Result<Self, sqlx::Error> {
        let primary = create_pool(&config.primary).await?;
        let replica = match &config.replica {
            Some(cfg) => Some(create_pool(cfg).await?),
            None => None,
        };
        Ok(Self::new(primary, replica))
    }

    /// Pool for read-write operations. Always the primary.
    pub fn writer(&self) -> &PgPool {
        &self.primary
    }

    /// Pool for read-only operations. The replica when configured, falling
    /// back to the primary otherwise.
    pub fn reader(&self) -> &PgPool {
        self.replica.as_ref().unwrap_or(&self.primary)
    }

    pub fn has_replica(&self) -> bool {
        self.replica.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_pool(url: &str) -> PgPool {
        PgPoolOptions::new()
            .connect_lazy(url)
            .expect("lazy pool from url")
    }

    #[tokio::test]
    async fn reader_prefers_replica_when_configured() {
        let primary = lazy_pool("postgres://primary@localhost/app");
        let replica = lazy_pool("postgres://replica@localhost/app");
        let pool = ReplicationPool::new(primary.clone(), Some(replica.clone()));

        assert!(pool.has_replica());
        assert!(std::ptr::eq(pool.writer(), pool.writer()));
        // reader and writer must resolve to different pools
        assert!(!std::ptr::eq(pool.reader(), pool.writer()));
    }

    #[tokio::test]
    async fn reader_falls_back_to_primary_without_replica() {
        let primary = lazy_pool("postgres://primary@localhost/app");
        let pool = ReplicationPool::new(primary, None);

        assert!(!pool.has_replica());
        assert!(std::ptr::eq(pool.reader(), pool.writer()));
    }
}
