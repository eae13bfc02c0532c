use std::time::Duration;

use async_trait::async_trait;

use crate::error::StateError;
use crate::key::CacheKey;

/// Shared cache tier sitting between the in-process cache and the table
/// store. Values are opaque strings (JSON in practice).
///
/// Implementations must be `Send + Sync` and safe for concurrent access.
#[async_trait]
pub trait DistributedCache: Send + Sync {
    /// Get the value for a key. Returns `None` if not found or expired.
    async fn get(&self, key: &CacheKey) -> Result<Option<String>, StateError>;

    /// Set a value with an optional TTL, overwriting any previous value.
    async fn set(
        &self,
        key: &CacheKey,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), StateError>;

    /// Delete a key. Returns `true` if the key existed.
    async fn delete(&self, key: &CacheKey) -> Result<bool, StateError>;
}
