use std::time::Duration;

use chrono::{TimeZone, Utc};

use crate::cache::DistributedCache;
use crate::entity::ContentEntity;
use crate::error::StateError;
use crate::key::CacheKey;
use crate::table::ContentTable;

fn test_entity(partition_key: &str, row_key: &str, title: &str) -> ContentEntity {
    ContentEntity {
        partition_key: partition_key.to_owned(),
        row_key: row_key.to_owned(),
        title: title.to_owned(),
        category: partition_key.to_owned(),
        tags: "a,b".to_owned(),
        difficulty: "Beginner".to_owned(),
        author: "tester".to_owned(),
        published_date: Utc
            .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_default(),
        description: "desc".to_owned(),
        content: "body".to_owned(),
        file_name: format!("{row_key}.md"),
        slug: row_key.to_owned(),
        content_hash: format!("hash-{title}"),
        ..ContentEntity::default()
    }
}

/// Run the content table conformance suite.
///
/// Call this from your backend's test module with a fresh, empty table.
///
/// # Errors
///
/// Returns an error if the backend fails an operation.
pub async fn run_table_conformance_tests(table: &dyn ContentTable) -> Result<(), StateError> {
    test_ensure_table_twice(table).await?;
    test_get_missing_row(table).await?;
    test_upsert_and_get(table).await?;
    test_upsert_replaces(table).await?;
    test_scan_returns_all(table).await?;
    Ok(())
}

/// Run the distributed cache conformance suite.
///
/// # Errors
///
/// Returns an error if the backend fails an operation.
pub async fn run_cache_conformance_tests(cache: &dyn DistributedCache) -> Result<(), StateError> {
    test_cache_get_missing(cache).await?;
    test_cache_set_and_get(cache).await?;
    test_cache_overwrite(cache).await?;
    test_cache_delete(cache).await?;
    test_cache_set_with_ttl(cache).await?;
    Ok(())
}

async fn test_ensure_table_twice(table: &dyn ContentTable) -> Result<(), StateError> {
    table.ensure_table().await?;
    table.ensure_table().await?;
    Ok(())
}

async fn test_get_missing_row(table: &dyn ContentTable) -> Result<(), StateError> {
    let row = table.get("nothing", "here").await?;
    assert!(row.is_none(), "get on missing row should return None");
    Ok(())
}

async fn test_upsert_and_get(table: &dyn ContentTable) -> Result<(), StateError> {
    let entity = test_entity("copilot", "first-tip", "First");
    table.upsert(&entity).await?;

    let stored = table.get("copilot", "first-tip").await?;
    let stored = stored.unwrap_or_default();
    assert_eq!(stored.title, "First");
    assert_eq!(stored.content_hash, "hash-First");
    assert_eq!(stored.tags, "a,b");
    assert_eq!(stored.published_date, entity.published_date);
    assert!(stored.timestamp.is_some(), "store should assign a timestamp");
    Ok(())
}

async fn test_upsert_replaces(table: &dyn ContentTable) -> Result<(), StateError> {
    table
        .upsert(&test_entity("copilot", "replaced", "Before"))
        .await?;
    table
        .upsert(&test_entity("copilot", "replaced", "After"))
        .await?;

    let stored = table.get("copilot", "replaced").await?.unwrap_or_default();
    assert_eq!(stored.title, "After", "upsert should replace the row");
    Ok(())
}

async fn test_scan_returns_all(table: &dyn ContentTable) -> Result<(), StateError> {
    table
        .upsert(&test_entity("azure", "scan-one", "Scan one"))
        .await?;
    table
        .upsert(&test_entity("azure", "scan-two", "Scan two"))
        .await?;

    let rows = table.scan().await?;
    for key in ["first-tip", "replaced", "scan-one", "scan-two"] {
        assert!(
            rows.iter().any(|r| r.row_key == key),
            "scan should include row {key}"
        );
    }
    let replaced = rows.iter().filter(|r| r.row_key == "replaced").count();
    assert_eq!(replaced, 1, "replaced row should appear once");
    Ok(())
}

async fn test_cache_get_missing(cache: &dyn DistributedCache) -> Result<(), StateError> {
    let val = cache.get(&CacheKey::new("conformance-missing")).await?;
    assert!(val.is_none(), "get on missing key should return None");
    Ok(())
}

async fn test_cache_set_and_get(cache: &dyn DistributedCache) -> Result<(), StateError> {
    let key = CacheKey::new("conformance-set-get");
    cache.set(&key, "[1,2,3]", None).await?;
    assert_eq!(cache.get(&key).await?.as_deref(), Some("[1,2,3]"));
    Ok(())
}

async fn test_cache_overwrite(cache: &dyn DistributedCache) -> Result<(), StateError> {
    let key = CacheKey::new("conformance-overwrite");
    cache.set(&key, "v1", None).await?;
    cache.set(&key, "v2", None).await?;
    assert_eq!(cache.get(&key).await?.as_deref(), Some("v2"));
    Ok(())
}

async fn test_cache_delete(cache: &dyn DistributedCache) -> Result<(), StateError> {
    let key = CacheKey::new("conformance-delete");
    cache.set(&key, "bye", None).await?;
    assert!(cache.delete(&key).await?, "delete should report existing key");
    assert!(cache.get(&key).await?.is_none());
    assert!(
        !cache.delete(&key).await?,
        "delete on missing key should return false"
    );
    Ok(())
}

async fn test_cache_set_with_ttl(cache: &dyn DistributedCache) -> Result<(), StateError> {
    let key = CacheKey::new("conformance-ttl");
    cache
        .set(&key, "short-lived", Some(Duration::from_secs(3600)))
        .await?;
    assert_eq!(cache.get(&key).await?.as_deref(), Some("short-lived"));
    Ok(())
}
