use redis::aio::ConnectionManager;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::models::NearbyQuery;

/// Errors that can occur with cache operations
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis error: {0}")]
    RedisError(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache miss: {0}")]
    CacheMiss(String),
}

/// Two-tier cache for nearby query results
///
/// L1 is an in-process moka cache. L2 is Redis, shared across instances, and
/// is optional: without it the manager behaves as a local cache only.
///
/// Entries are invalidated by advancing a generation number that callers
/// embed in their keys. With Redis the generation lives there, so an
/// advance on one instance retires the L1 entries of every instance.
pub struct CacheManager {
    redis: Option<Arc<tokio::sync::Mutex<ConnectionManager>>>,
    l1_cache: moka::future::Cache<String, Vec<u8>>,
    local_generation: AtomicU64,
    ttl_secs: u64,
}

impl CacheManager {
    /// Create a cache manager backed by Redis
    pub async fn new(redis_url: &str, l1_size: u64, ttl_secs: u64) -> Result<Self, CacheError> {
        let client = redis::Client::open(redis_url)?;
        let redis = redis::aio::ConnectionManager::new(client).await?;

        Ok(Self {
            redis: Some(Arc::new(tokio::sync::Mutex::new(redis))),
            ..Self::local(l1_size, ttl_secs)
        })
    }

    /// Create an in-process-only cache manager
    pub fn local(l1_size: u64, ttl_secs: u64) -> Self {
        let l1_cache = moka::future::CacheBuilder::new(l1_size)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self {
            redis: None,
            l1_cache,
            local_generation: AtomicU64::new(0),
            ttl_secs,
        }
    }

    /// Connect to Redis if configured, falling back to a local cache
    pub async fn connect_or_local(redis_url: Option<&str>, l1_size: u64, ttl_secs: u64) -> Self {
        let Some(url) = redis_url else {
            return Self::local(l1_size, ttl_secs);
        };

        match Self::new(url, l1_size, ttl_secs).await {
            Ok(cache) => cache,
            Err(e) => {
                tracing::warn!("Failed to connect to Redis ({}), using in-process cache only", e);
                Self::local(l1_size, ttl_secs)
            }
        }
    }

    pub fn is_shared(&self) -> bool {
        self.redis.is_some()
    }

    /// Get a value from cache (L1 first, then L2)
    pub async fn get<T>(&self, key: &str) -> Result<T, CacheError>
    where
        T: for<'de> Deserialize<'de>,
    {
        if let Some(bytes) = self.l1_cache.get(key).await {
            tracing::trace!("L1 cache hit: {}", key);
            return Ok(serde_json::from_slice(&bytes)?);
        }

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Option<String> = redis::cmd("GET")
                .arg(key)
                .query_async(&mut *conn)
                .await?;
            drop(conn);

            if let Some(json) = value {
                tracing::trace!("L2 cache hit: {}", key);

                let bytes = json.as_bytes().to_vec();
                self.l1_cache.insert(key.to_string(), bytes).await;

                return Ok(serde_json::from_str(&json)?);
            }
        }

        tracing::trace!("Cache miss: {}", key);
        Err(CacheError::CacheMiss(key.to_string()))
    }

    /// Set a value in cache (both tiers)
    pub async fn set<T>(&self, key: &str, value: &T) -> Result<(), CacheError>
    where
        T: Serialize,
    {
        let json = serde_json::to_string(value)?;

        self.l1_cache
            .insert(key.to_string(), json.as_bytes().to_vec())
            .await;

        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            redis::cmd("SETEX")
                .arg(key)
                .arg(self.ttl_secs)
                .arg(json)
                .query_async::<()>(&mut *conn)
                .await?;
        }

        tracing::trace!("Cache set: {}", key);
        Ok(())
    }

    /// Current cache generation
    ///
    /// Read from Redis when it is configured so every instance agrees on it.
    pub async fn generation(&self) -> Result<u64, CacheError> {
        if let Some(redis) = &self.redis {
            let mut conn = redis.lock().await;
            let value: Option<u64> = redis::cmd("GET")
                .arg(CacheKey::GENERATION)
                .query_async(&mut *conn)
                .await?;
            return Ok(value.unwrap_or(0));
        }

        Ok(self.local_generation.load(Ordering::SeqCst))
    }

    /// Advance the generation so keys built from an older one are never read again
    pub async fn next_generation(&self) -> Result<u64, CacheError> {
        self.l1_cache.invalidate_all();
        let local = self.local_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let generation = match &self.redis {
            Some(redis) => {
                let mut conn = redis.lock().await;
                redis::cmd("INCR")
                    .arg(CacheKey::GENERATION)
                    .query_async(&mut *conn)
                    .await?
            }
            None => local,
        };

        tracing::debug!("Cache generation advanced to {}", generation);
        Ok(generation)
    }
}

/// Cache key builder
pub struct CacheKey;

impl CacheKey {
    /// Redis key holding the shared cache generation
    pub const GENERATION: &'static str = "tunemap:cache_generation";

    /// Build a cache key for a nearby query
    ///
    /// Coordinates and radius are written in full so distinct queries never
    /// share an entry.
    pub fn nearby(generation: u64, query: &NearbyQuery) -> String {
        format!(
            "nearby:{}:{}:{}:{}",
            generation, query.center.latitude, query.center.longitude, query.radius_km
        )
    }
}
