use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use jawn_state::{ContentEntity, ContentTable, StateError};

/// In-memory [`ContentTable`] keyed by `(partition_key, row_key)`.
///
/// Upserts stamp the row with the current time and a monotonically
/// increasing etag.
#[derive(Debug, Default)]
pub struct MemoryContentTable {
    rows: DashMap<(String, String), ContentEntity>,
    version: AtomicU64,
}

impl MemoryContentTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[async_trait]
impl ContentTable for MemoryContentTable {
    async fn ensure_table(&self) -> Result<(), StateError> {
        Ok(())
    }

    async fn get(
        &self,
        partition_key: &str,
        row_key: &str,
    ) -> Result<Option<ContentEntity>, StateError> {
        let key = (partition_key.to_owned(), row_key.to_owned());
        Ok(self.rows.get(&key).map(|row| row.value().clone()))
    }

    async fn upsert(&self, entity: &ContentEntity) -> Result<(), StateError> {
        let version = self.version.fetch_add(1, Ordering::Relaxed) + 1;
        let mut row = entity.clone();
        row.timestamp = Some(Utc::now());
        row.etag = Some(format!("W/\"{version}\""));
        self.rows.insert(
            (entity.partition_key.clone(), entity.row_key.clone()),
            row,
        );
        Ok(())
    }

    async fn scan(&self) -> Result<Vec<ContentEntity>, StateError> {
        Ok(self.rows.iter().map(|row| row.value().clone()).collect())
    }
}
