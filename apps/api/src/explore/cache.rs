//! Read-through cache for liker pages and counts.
//!
//! Entries are derived data with a fixed TTL and are never invalidated when a
//! decision is written. Listings and counts may therefore lag the store by up
//! to one TTL window.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use thiserror::Error;

use crate::models::decision::LikersPage;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache miss")]
    Miss,

    #[error("redis error: {0}")]
    Backend(#[from] redis::RedisError),

    #[error("cached value could not be (de)serialized: {0}")]
    Codec(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub prefix: String,
    pub ttl: Duration,
}

/// `{prefix}:likers:{recipient}:{boundary-or-0}:{exclude_mutual}`
pub fn likers_key(
    prefix: &str,
    recipient_id: &str,
    boundary: Option<u64>,
    exclude_mutual: bool,
) -> String {
    format!(
        "{prefix}:likers:{recipient_id}:{}:{exclude_mutual}",
        boundary.unwrap_or(0)
    )
}

/// `{prefix}:count:{recipient}`
pub fn count_key(prefix: &str, recipient_id: &str) -> String {
    format!("{prefix}:count:{recipient_id}")
}

#[async_trait]
pub trait LikerCache: Send + Sync {
    async fn get_likers_page(
        &self,
        recipient_id: &str,
        boundary: Option<u64>,
        exclude_mutual: bool,
    ) -> Result<LikersPage, CacheError>;

    async fn set_likers_page(
        &self,
        recipient_id: &str,
        boundary: Option<u64>,
        exclude_mutual: bool,
        page: &LikersPage,
    ) -> Result<(), CacheError>;

    async fn get_count(&self, recipient_id: &str) -> Result<u64, CacheError>;

    async fn set_count(&self, recipient_id: &str, count: u64) -> Result<(), CacheError>;
}

/// Redis-backed cache. The connection manager is cheap to clone and reconnects
/// on its own, so each call works on a clone.
pub struct RedisLikerCache {
    conn: ConnectionManager,
    config: CacheConfig,
}

impl RedisLikerCache {
    pub fn new(conn: ConnectionManager, config: CacheConfig) -> Self {
        Self { conn, config }
    }

    async fn get_raw(&self, key: &str) -> Result<String, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        value.ok_or(CacheError::Miss)
    }

    async fn set_raw(&self, key: &str, value: String) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(self.config.ttl.as_secs().max(1))
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl LikerCache for RedisLikerCache {
    async fn get_likers_page(
        &self,
        recipient_id: &str,
        boundary: Option<u64>,
        exclude_mutual: bool,
    ) -> Result<LikersPage, CacheError> {
        let key = likers_key(&self.config.prefix, recipient_id, boundary, exclude_mutual);
        let raw = self.get_raw(&key).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn set_likers_page(
        &self,
        recipient_id: &str,
        boundary: Option<u64>,
        exclude_mutual: bool,
        page: &LikersPage,
    ) -> Result<(), CacheError> {
        let key = likers_key(&self.config.prefix, recipient_id, boundary, exclude_mutual);
        self.set_raw(&key, serde_json::to_string(page)?).await
    }

    async fn get_count(&self, recipient_id: &str) -> Result<u64, CacheError> {
        let key = count_key(&self.config.prefix, recipient_id);
        let raw = self.get_raw(&key).await?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn set_count(&self, recipient_id: &str, count: u64) -> Result<(), CacheError> {
        let key = count_key(&self.config.prefix, recipient_id);
        self.set_raw(&key, count.to_string()).await
    }
}

/// Opens a connection manager and checks the server answers `PING`.
pub async fn connect_redis(redis_url: &str) -> anyhow::Result<ConnectionManager> {
    let client = redis::Client::open(redis_url)?;
    let mut conn = client.get_connection_manager().await?;
    let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
    tracing::info!("Redis connection established ({pong})");
    Ok(conn)
}
