use async_trait::async_trait;

use crate::entity::ContentEntity;
use crate::error::StateError;

/// Name of the table holding every article.
pub const CONTENT_TABLE: &str = "Content";

/// Table store holding one [`ContentEntity`] per article, addressed by
/// `(partition_key, row_key)`.
#[async_trait]
pub trait ContentTable: Send + Sync {
    /// Create the table if it does not exist yet.
    async fn ensure_table(&self) -> Result<(), StateError>;

    /// Point lookup. Returns `None` when no row matches.
    async fn get(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<ContentEntity>, StateError>;

    /// Insert or replace the row identified by the entity's keys.
    ///
    /// The store assigns `timestamp` (and `etag` where supported); the
    /// values on `entity` are ignored.
    async fn upsert(&self, entity: &ContentEntity) -> Result<(), StateError>;

    /// Every row in the table, in no particular order.
    async fn scan(&self) -> Result<Vec<ContentEntity>, StateError>;
}
