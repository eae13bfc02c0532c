use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::{Config, Pool, Runtime};
use redis::AsyncCommands;
use tracing::debug;

use jawn_state::{CacheKey, DistributedCache, StateError};

use crate::config::RedisConfig;
use crate::key_render::render_key;

/// Redis-backed implementation of [`DistributedCache`].
///
/// Values are plain Redis strings. TTLs map onto `SET ... PX`.
pub struct RedisDistributedCache {
    pool: Pool,
    prefix: String,
}

impl RedisDistributedCache {
    /// Create a new cache from the provided configuration.
    ///
    /// The pool connects lazily, so an unreachable server surfaces on the
    /// first operation rather than here.
    ///
    /// # Errors
    ///
    /// Returns [`StateError::Connection`] if the pool cannot be created.
    pub fn new(config: &RedisConfig) -> Result<Self, StateError> {
        let cfg = Config::from_url(&config.url);
        let pool = cfg
            .builder()
            .map(|b| {
                b.max_size(config.pool_size)
                    .wait_timeout(Some(config.connection_timeout))
                    .runtime(Runtime::Tokio1)
                    .build()
            })
            .map_err(|e| StateError::Connection(e.to_string()))?
            .map_err(|e| StateError::Connection(e.to_string()))?;

        Ok(Self {
            pool,
            prefix: config.prefix.clone(),
        })
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, StateError> {
        self.pool
            .get()
            .await
            .map_err(|e| StateError::Connection(e.to_string()))
    }
}

#[async_trait]
impl DistributedCache for RedisDistributedCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, StateError> {
        let redis_key = render_key(&self.prefix, key);
        let mut conn = self.conn().await?;
        let val: Option<String> = conn
            .get(&redis_key)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        debug!(key = %redis_key, hit = val.is_some(), "redis cache get");
        Ok(val)
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StateError> {
        let redis_key = render_key(&self.prefix, key);
        let mut conn = self.conn().await?;

        match ttl {
            Some(d) => {
                let ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX).max(1);
                let _: () = conn
                    .pset_ex(&redis_key, value, ms)
                    .await
                    .map_err(|e| StateError::Backend(e.to_string()))?;
            }
            None => {
                let _: () = conn
                    .set(&redis_key, value)
                    .await
                    .map_err(|e| StateError::Backend(e.to_string()))?;
            }
        }
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, StateError> {
        let redis_key = render_key(&self.prefix, key);
        let mut conn = self.conn().await?;
        let deleted: i64 = conn
            .del(&redis_key)
            .await
            .map_err(|e| StateError::Backend(e.to_string()))?;
        Ok(deleted > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_creation_does_not_connect() {
        let config = RedisConfig::default().with_url("redis://127.0.0.1:1");
        assert!(RedisDistributedCache::new(&config).is_ok());
    }

    #[test]
    fn invalid_url_is_connection_error() {
        let config = RedisConfig::default().with_url("not a url");
        assert!(matches!(
            RedisDistributedCache::new(&config),
            Err(StateError::Connection(_))
        ));
    }
}
