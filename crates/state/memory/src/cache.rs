use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::time::Instant;

use jawn_state::{CacheKey, DistributedCache, StateError};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|deadline| Instant::now() >= deadline)
    }
}

/// In-process [`DistributedCache`] backed by a [`DashMap`].
///
/// Useful for single-instance deployments and tests. Expired entries are
/// evicted lazily on access.
#[derive(Debug, Default)]
pub struct MemoryDistributedCache {
    data: DashMap<String, Entry>,
}

impl MemoryDistributedCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.data.iter().filter(|e| !e.is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DistributedCache for MemoryDistributedCache {
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, StateError> {
        let rendered = key.canonical();

        if let Some(entry) = self.data.get(rendered) {
            if entry.is_expired() {
                drop(entry);
                self.data.remove(rendered);
                return Ok(None);
            }
            return Ok(Some(entry.value.clone()));
        }
        Ok(None)
    }

    async fn set(
        &self,
        key: &CacheKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StateError> {
        self.data.insert(
            key.canonical().to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: ttl.map(|d| Instant::now() + d),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, StateError> {
        match self.data.remove(key.canonical()) {
            Some((_, entry)) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jawn_state::testing::run_cache_conformance_tests;

    use super::*;

    #[tokio::test]
    async fn conformance() {
        let cache = MemoryDistributedCache::new();
        run_cache_conformance_tests(&cache)
            .await
            .expect("conformance tests should pass");
    }

    #[tokio::test(start_paused = true)]
    async fn ttl_expiry_via_get() {
        let cache = MemoryDistributedCache::new();
        let key = CacheKey::content_tips();

        cache
            .set(&key, "[]", Some(Duration::from_secs(5)))
            .await
            .unwrap();
        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("[]"));

        tokio::time::advance(Duration::from_secs(6)).await;

        assert!(cache.get(&key).await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn delete_of_expired_entry_reports_missing() {
        let cache = MemoryDistributedCache::new();
        let key = CacheKey::new("gone");
        cache
            .set(&key, "v", Some(Duration::from_secs(1)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;

        assert!(!cache.delete(&key).await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn no_ttl_never_expires() {
        let cache = MemoryDistributedCache::new();
        let key = CacheKey::new("forever");
        cache.set(&key, "v", None).await.unwrap();

        tokio::time::advance(Duration::from_secs(86_400 * 365)).await;

        assert_eq!(cache.get(&key).await.unwrap().as_deref(), Some("v"));
        assert_eq!(cache.len(), 1);
    }
}
