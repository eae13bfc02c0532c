use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;

use crate::error::BlobError;
use crate::store::{BlobStore, StoredBlob};

/// [`BlobStore`] kept entirely in process memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<(String, String), StoredBlob>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Names stored in `container`, sorted.
    pub fn names(&self, container: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .blobs
            .iter()
            .filter(|e| e.key().0 == container)
            .map(|e| e.key().1.clone())
            .collect();
        names.sort();
        names
    }
}

fn key(container: &str, name: &str) -> Result<(String, String), BlobError> {
    if name.trim_matches('/').is_empty() {
        return Err(BlobError::InvalidName(name.to_owned()));
    }
    Ok((container.to_owned(), name.to_owned()))
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        container: &str,
        name: &str,
        content_type: &str,
        data: Bytes,
    ) -> Result<(), BlobError> {
        self.blobs.insert(
            key(container, name)?,
            StoredBlob {
                data,
                content_type: Some(content_type.to_owned()),
            },
        );
        Ok(())
    }

    async fn get(&self, container: &str, name: &str) -> Result<Option<StoredBlob>, BlobError> {
        Ok(self
            .blobs
            .get(&key(container, name)?)
            .map(|b| b.value().clone()))
    }

    async fn delete(&self, container: &str, name: &str) -> Result<bool, BlobError> {
        Ok(self.blobs.remove(&key(container, name)?).is_some())
    }
}
