use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BlobError;

/// A blob read back from a [`BlobStore`].
#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub data: Bytes,
    /// MIME type recorded at upload, when the backend keeps one.
    pub content_type: Option<String>,
}

/// Blob storage addressed by `(container, name)`.
///
/// Names may contain `/` separators (`{imageId}/{size}`); stores treat them
/// as opaque.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` under `name`, overwriting any existing blob.
    async fn put(
        &self,
        container: &str,
        name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<(), BlobError>;

    /// Fetch a blob. Returns `None` when it does not exist.
    async fn get(&self, container: &str, name: &str) -> Result<Option<StoredBlob>, BlobError>;

    /// Delete a blob. Returns `true` if it existed.
    async fn delete(&self, container: &str, name: &str) -> Result<bool, BlobError>;
}
