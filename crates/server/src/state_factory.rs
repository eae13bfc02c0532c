use std::sync::Arc;

use jawn_state::{ContentTable, DistributedCache};
use jawn_state_memory::{MemoryContentTable, MemoryDistributedCache};
use tracing::info;

use crate::config::{CacheConfig, StorageConfig};
use crate::error::ServerError;

/// Create the article table from the given configuration, making sure the
/// table exists.
pub async fn create_table(config: &StorageConfig) -> Result<Arc<dyn ContentTable>, ServerError> {
    let table: Arc<dyn ContentTable> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryContentTable::new()),
        #[cfg(feature = "azure")]
        "azure" => {
            let connection_string = config
                .connection_string
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .ok_or_else(|| {
                    ServerError::Config(
                        "azure storage backend requires [storage] connection_string".into(),
                    )
                })?;
            let connection = jawn_azure::StorageConnection::parse(connection_string)
                .map_err(|e| ServerError::Config(format!("storage connection string: {e}")))?;
            let table =
                jawn_azure::AzureContentTable::with_table_name(connection, &config.table_name)
                    .map_err(|e| ServerError::Config(format!("azure table: {e}")))?;
            Arc::new(table)
        }
        other => {
            return Err(ServerError::Config(format!(
                "unsupported storage backend: {other}"
            )));
        }
    };

    table
        .ensure_table()
        .await
        .map_err(|e| ServerError::Config(format!("failed to prepare content table: {e}")))?;
    info!(backend = %config.backend, table = %config.table_name, "content table ready");
    Ok(table)
}

/// Create the distributed cache tier from the given configuration.
pub fn create_cache(config: &CacheConfig) -> Result<Arc<dyn DistributedCache>, ServerError> {
    let cache: Arc<dyn DistributedCache> = match config.backend.as_str() {
        "memory" => Arc::new(MemoryDistributedCache::new()),
        #[cfg(feature = "redis")]
        "redis" => {
            let url = config.url.as_deref().ok_or_else(|| {
                ServerError::Config("redis cache backend requires [cache] url".into())
            })?;
            let redis_config = jawn_state_redis::RedisConfig::default()
                .with_url(url)
                .with_prefix(&config.prefix);
            let cache = jawn_state_redis::RedisDistributedCache::new(&redis_config)
                .map_err(|e| ServerError::Config(format!("redis cache: {e}")))?;
            Arc::new(cache)
        }
        other => {
            return Err(ServerError::Config(format!(
                "unsupported cache backend: {other}"
            )));
        }
    };
    info!(backend = %config.backend, "distributed cache ready");
    Ok(cache)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_backends_are_default() {
        let table = create_table(&StorageConfig::default()).await.unwrap();
        assert!(table.scan().await.unwrap().is_empty());
        assert!(create_cache(&CacheConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn unknown_backends_are_config_errors() {
        let storage = StorageConfig {
            backend: "cosmos".into(),
            ..StorageConfig::default()
        };
        assert!(matches!(
            create_table(&storage).await,
            Err(ServerError::Config(_))
        ));

        let cache = CacheConfig {
            backend: "memcached".into(),
            ..CacheConfig::default()
        };
        assert!(matches!(create_cache(&cache), Err(ServerError::Config(_))));
    }

    #[cfg(feature = "azure")]
    #[tokio::test]
    async fn azure_backend_requires_connection_string() {
        let storage = StorageConfig {
            backend: "azure".into(),
            ..StorageConfig::default()
        };
        let Err(ServerError::Config(msg)) = create_table(&storage).await else {
            panic!("expected a configuration error");
        };
        assert!(msg.contains("connection_string"));
    }

    #[cfg(feature = "redis")]
    #[test]
    fn redis_backend_requires_url() {
        let cache = CacheConfig {
            backend: "redis".into(),
            ..CacheConfig::default()
        };
        assert!(matches!(create_cache(&cache), Err(ServerError::Config(_))));
    }
}
